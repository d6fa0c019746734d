//! Uniform outcome of an operation handler.
//!
//! Every handler returns a [`WorkerResult`]. Success carries nothing; a
//! failure carries a non-zero [`ErrorCode`] and a message that reach the
//! controller unchanged. There is no other failure path: a handler that
//! wants to fail returns `Err`.

use std::fmt;

use courier_protocol::{Command, ErrorCode};

use crate::channel::ChannelError;
use crate::error::AnswerError;

/// Outcome of one handler invocation.
pub type WorkerResult = Result<(), WorkerFailure>;

/// The failure half of [`WorkerResult`].
///
/// # Example
///
/// ```
/// use courier_protocol::ErrorCode;
/// use courier_worker::{WorkerFailure, WorkerResult};
///
/// fn refuse() -> WorkerResult {
///     Err(WorkerFailure::new(ErrorCode::ACCESS_DENIED, "/etc/shadow"))
/// }
///
/// let failure = refuse().unwrap_err();
/// assert_eq!(failure.code(), ErrorCode::ACCESS_DENIED);
/// assert_eq!(failure.message(), "/etc/shadow");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFailure {
    code: ErrorCode,
    message: String,
}

impl WorkerFailure {
    /// Creates a failure with an explicit code.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The selector is not implemented by this scheme.
    #[must_use]
    pub fn unsupported_action(protocol: &str, command: &Command) -> Self {
        let action = match command {
            Command::Extension { id, .. } => format!("extension {id}"),
            other => other.selector().to_string(),
        };
        Self::new(
            ErrorCode::UNSUPPORTED_ACTION,
            format!("the {protocol} protocol does not support {action}"),
        )
    }

    /// The resource does not exist.
    #[must_use]
    pub fn does_not_exist(resource: impl Into<String>) -> Self {
        Self::new(ErrorCode::DOES_NOT_EXIST, resource)
    }

    /// A file already exists at the destination.
    #[must_use]
    pub fn already_exists(resource: impl Into<String>) -> Self {
        Self::new(ErrorCode::FILE_ALREADY_EXIST, resource)
    }

    /// The user cancelled the operation.
    #[must_use]
    pub fn user_canceled(resource: impl Into<String>) -> Self {
        Self::new(ErrorCode::USER_CANCELED, resource)
    }

    /// The backend connection broke.
    #[must_use]
    pub fn connection_broken(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::CONNECTION_BROKEN, detail)
    }

    /// The exchange with the controller broke down.
    #[must_use]
    pub fn communication_failure(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::COMMUNICATION_FAILURE, detail)
    }

    /// Internal worker fault.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::INTERNAL, detail)
    }

    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the message.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Splits the failure into its code and message.
    #[must_use]
    pub fn into_parts(self) -> (ErrorCode, String) {
        (self.code, self.message)
    }
}

impl fmt::Display for WorkerFailure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "error {}: {}", self.code, self.message)
    }
}

impl From<ChannelError> for WorkerFailure {
    fn from(error: ChannelError) -> Self {
        Self::communication_failure(error.to_string())
    }
}

impl From<AnswerError> for WorkerFailure {
    fn from(error: AnswerError) -> Self {
        match error {
            AnswerError::Killed { .. } => Self::new(ErrorCode::ABORTED, error.to_string()),
            other => Self::communication_failure(other.to_string()),
        }
    }
}
