//! Nested question and answer exchanges run from inside a handler.
//!
//! A handler sends a question frame and then waits for one of at most two
//! answer selectors. While waiting the session is `AwaitingAnswer`; the
//! top-level loop is not re-entered. Any other frame, `metadata` included,
//! fails the wait.

use std::fmt;
use std::time::Duration;

use courier_protocol::{
    AuthInfo, ButtonCode, Command, HostInfo, MessageBoxRequest, Notification, PrivilegeStatus,
    Selector,
};
use tracing::{debug, warn};

use super::{SESSION_TARGET, Session, SessionState};
use crate::channel::ChannelError;
use crate::error::AnswerError;

/// How often a wait wakes to check the kill switch.
const ANSWER_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The selectors a nested wait accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAnswer {
    first: Selector,
    second: Option<Selector>,
}

impl PendingAnswer {
    /// Accepts only `selector`.
    #[must_use]
    pub const fn one(selector: Selector) -> Self {
        Self {
            first: selector,
            second: None,
        }
    }

    /// Accepts either `first` or `second`.
    #[must_use]
    pub const fn either(first: Selector, second: Selector) -> Self {
        Self {
            first,
            second: Some(second),
        }
    }

    /// Returns `true` when `selector` satisfies the wait.
    #[must_use]
    pub fn accepts(self, selector: Selector) -> bool {
        self.first == selector || self.second == Some(selector)
    }
}

impl fmt::Display for PendingAnswer {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(second) = self.second {
            return write!(formatter, "{} or {second}", self.first);
        }
        write!(formatter, "{}", self.first)
    }
}

/// A frame that satisfied a nested wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    selector: Selector,
    command: Command,
}

impl Answer {
    /// Returns which of the accepted selectors arrived.
    #[must_use]
    pub const fn selector(&self) -> Selector {
        self.selector
    }

    /// Returns the answer frame.
    #[must_use]
    pub const fn command(&self) -> &Command {
        &self.command
    }

    /// Consumes the answer, returning its frame.
    #[must_use]
    pub fn into_command(self) -> Command {
        self.command
    }
}

impl Session {
    /// Blocks until the controller sends a frame `pending` accepts.
    ///
    /// Only one wait may be outstanding per session; the mutable borrow
    /// enforces it.
    ///
    /// # Errors
    ///
    /// Returns [`AnswerError::Mismatch`] for any other frame,
    /// [`AnswerError::ConnectionLost`] if the controller goes away (the
    /// session then terminates), [`AnswerError::Killed`] if the kill switch
    /// trips, and [`AnswerError::Channel`] for transport failures.
    pub fn wait_for_answer(&mut self, pending: PendingAnswer) -> Result<Answer, AnswerError> {
        let previous = std::mem::replace(&mut self.state, SessionState::AwaitingAnswer(pending));
        debug!(target: SESSION_TARGET, expected = %pending, "awaiting answer");
        let outcome = self.await_matching(pending);
        match &outcome {
            Err(error) if error.is_connection_lost() => self.terminate(),
            _ => self.state = previous,
        }
        outcome
    }

    fn await_matching(&mut self, pending: PendingAnswer) -> Result<Answer, AnswerError> {
        loop {
            if self.was_killed() {
                return Err(AnswerError::Killed { expected: pending });
            }
            let command = match self.receive(Some(ANSWER_POLL_INTERVAL)) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(ChannelError::ConnectionLost) => {
                    warn!(
                        target: SESSION_TARGET,
                        expected = %pending,
                        "connection lost while awaiting answer"
                    );
                    return Err(AnswerError::ConnectionLost { expected: pending });
                }
                Err(error) => return Err(error.into()),
            };
            let selector = command.selector();
            if pending.accepts(selector) {
                return Ok(Answer { selector, command });
            }
            warn!(
                target: SESSION_TARGET,
                expected = %pending,
                received = %selector,
                "unexpected frame while awaiting answer"
            );
            return Err(AnswerError::Mismatch {
                expected: pending,
                received: selector,
            });
        }
    }

    /// Shows a message box and returns the button the user chose.
    ///
    /// # Errors
    ///
    /// Returns an [`AnswerError`] if the exchange fails.
    pub fn message_box(&mut self, request: MessageBoxRequest) -> Result<ButtonCode, AnswerError> {
        self.send(&Notification::MessageBox { request })?;
        let answer = self.wait_for_answer(PendingAnswer::one(Selector::MessageBoxAnswer))?;
        match answer.into_command() {
            Command::MessageBoxAnswer { button } => Ok(button),
            _ => Ok(ButtonCode::Cancel),
        }
    }

    /// Prompts the user for credentials.
    ///
    /// `error_message` explains a previous failed attempt and may be empty.
    /// On `Ok(true)` the controller's reply has replaced `info`. `Ok(false)`
    /// means the user cancelled and `info` is unchanged.
    ///
    /// # Errors
    ///
    /// Returns an [`AnswerError`] if the exchange fails.
    pub fn open_password_dialog(
        &mut self,
        info: &mut AuthInfo,
        error_message: &str,
    ) -> Result<bool, AnswerError> {
        self.send(&Notification::CredentialPrompt {
            auth: info.clone(),
            error_message: error_message.to_owned(),
        })?;
        let answer = self.wait_for_answer(PendingAnswer::one(Selector::CredentialAnswer))?;
        match answer.into_command() {
            Command::CredentialAnswer { auth: Some(reply) } => {
                *info = reply;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Asks the controller to resolve `hostname`.
    ///
    /// Pair with [`Session::wait_for_host_info`].
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn lookup_host(&mut self, hostname: impl Into<String>) -> Result<(), ChannelError> {
        self.send(&Notification::HostLookup {
            hostname: hostname.into(),
        })
    }

    /// Waits for the reply to [`Session::lookup_host`].
    ///
    /// # Errors
    ///
    /// Returns an [`AnswerError`] if the exchange fails.
    pub fn wait_for_host_info(&mut self) -> Result<HostInfo, AnswerError> {
        let answer = self.wait_for_answer(PendingAnswer::one(Selector::HostInfo))?;
        match answer.into_command() {
            Command::HostInfo { info } => Ok(info),
            _ => Ok(HostInfo::default()),
        }
    }

    /// Asks whether a partial transfer may resume at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an [`AnswerError`] if the exchange fails.
    pub fn can_resume(&mut self, offset: u64) -> Result<bool, AnswerError> {
        self.send(&Notification::CanResume { offset })?;
        let answer = self.wait_for_answer(PendingAnswer::one(Selector::ResumeAnswer))?;
        Ok(matches!(
            answer.command(),
            Command::ResumeAnswer { accepted: true }
        ))
    }

    /// Asks the privilege broker to authorise the action in `details`.
    ///
    /// A failed exchange yields [`PrivilegeStatus::Unknown`].
    pub fn request_privilege_operation(&mut self, details: impl Into<String>) -> PrivilegeStatus {
        let exchange = self
            .send(&Notification::PrivilegeRequest {
                details: details.into(),
            })
            .map_err(AnswerError::from)
            .and_then(|()| self.wait_for_answer(PendingAnswer::one(Selector::PrivilegeAnswer)));
        let answer = match exchange {
            Ok(answer) => answer,
            Err(error) => {
                warn!(target: SESSION_TARGET, %error, "privilege request failed");
                return PrivilegeStatus::Unknown;
            }
        };
        match answer.into_command() {
            Command::PrivilegeAnswer { status } => status,
            _ => PrivilegeStatus::Unknown,
        }
    }
}
