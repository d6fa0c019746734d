//! The single-threaded dispatch loop.
//!
//! [`Dispatcher::run`] reads one command at a time, routes it through the
//! [`OperationTable`], runs the handler to completion and translates the
//! handler's [`WorkerResult`] into notifications according to the
//! selector's [`Finalization`] class. Nothing else reads the channel while a
//! handler runs, except the handler's own nested waits.

use std::time::{Duration, Instant};

use courier_protocol::{Command, ErrorCode, Notification, Selector};
use tracing::{debug, info, warn};

use crate::channel::{Channel, ChannelError};
use crate::collaborators::AuthStore;
use crate::error::WorkerError;
use crate::kill::KillSwitch;
use crate::result::{WorkerFailure, WorkerResult};
use crate::session::Session;
use crate::table::{Finalization, OperationTable, Route};

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
pub(crate) const TIMER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::timer");

/// Upper bound on how long the idle loop blocks before re-checking the kill
/// switch and the idle timer.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs a worker of type `W` against a channel.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use courier_protocol::{Command, Entry, Notification, Selector};
/// use courier_worker::channel::MemoryChannel;
/// use courier_worker::{Dispatcher, OperationTable};
///
/// let mut table = OperationTable::<()>::new();
/// table
///     .register(Selector::Stat, |_, session, _| {
///         session.stat_entry(Entry::file("a.txt", 3))?;
///         Ok(())
///     })
///     .unwrap();
///
/// let (channel, controller) = MemoryChannel::pair();
/// let mut dispatcher = Dispatcher::new("demo", (), table, channel);
/// let url = url::Url::parse("demo:/a.txt").unwrap();
/// dispatcher.dispatch(Command::Stat { url }).unwrap();
///
/// let frames = controller.collect_operation(Duration::from_millis(10));
/// assert_eq!(frames.last(), Some(&Notification::Finished));
/// ```
pub struct Dispatcher<W> {
    worker: W,
    table: OperationTable<W>,
    session: Session,
}

impl<W> std::fmt::Debug for Dispatcher<W> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Dispatcher")
            .field("table", &self.table)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl<W> Dispatcher<W> {
    /// Creates a dispatcher for `protocol` with the given handlers.
    pub fn new(
        protocol: impl Into<String>,
        worker: W,
        table: OperationTable<W>,
        channel: impl Channel + 'static,
    ) -> Self {
        Self {
            worker,
            table,
            session: Session::new(protocol.into(), Box::new(channel)),
        }
    }

    /// Replaces the credential cache.
    #[must_use]
    pub fn with_auth_store(mut self, store: impl AuthStore + 'static) -> Self {
        self.session.set_auth_store(Box::new(store));
        self
    }

    /// Shares `kill` with the session, so tripping it stops this worker.
    #[must_use]
    pub fn with_kill_switch(mut self, kill: KillSwitch) -> Self {
        self.session.set_kill_switch(kill);
        self
    }

    /// Returns the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the session mutably.
    pub const fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Returns the worker state.
    #[must_use]
    pub const fn worker(&self) -> &W {
        &self.worker
    }

    /// Returns the worker state mutably.
    pub const fn worker_mut(&mut self) -> &mut W {
        &mut self.worker
    }

    /// Returns the operation table.
    #[must_use]
    pub const fn table(&self) -> &OperationTable<W> {
        &self.table
    }

    /// Consumes the dispatcher, returning the worker state.
    #[must_use]
    pub fn into_worker(self) -> W {
        self.worker
    }

    /// Processes one command to completion.
    ///
    /// Operation selectors run their handler and produce their finalization
    /// frames. `metadata` merges into the incoming set and `exit` stops the
    /// session; neither produces a frame. Answer frames that arrive with no
    /// question pending are logged and dropped. Once the session is
    /// terminating every command is refused.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if a notification cannot be sent.
    pub fn dispatch(&mut self, command: Command) -> Result<(), ChannelError> {
        if self.session.is_terminating() {
            warn!(
                target: DISPATCH_TARGET,
                selector = %command.selector(),
                "command refused after termination"
            );
            return Ok(());
        }
        let operation = match command {
            Command::Metadata { entries } => {
                self.session.merge_incoming(entries);
                return Ok(());
            }
            Command::Exit => {
                info!(target: DISPATCH_TARGET, "exit requested");
                self.session.terminate();
                return Ok(());
            }
            other => self.table.redirect(other),
        };
        let selector = operation.selector();
        let Some(class) = Finalization::for_selector(selector) else {
            warn!(
                target: DISPATCH_TARGET,
                %selector,
                "answer frame received with no question pending"
            );
            return Ok(());
        };
        debug!(target: DISPATCH_TARGET, %selector, "dispatching");
        self.session.begin_operation(selector);
        let outcome = self.invoke(&operation);
        let reported = self.finalize(class, selector, outcome);
        self.session.end_operation();
        reported
    }

    fn invoke(&mut self, command: &Command) -> WorkerResult {
        match self.table.route(command) {
            Route::Handler(handler) => handler(&mut self.worker, &mut self.session, command),
            Route::DefaultStatus => self.session.status("", false).map_err(WorkerFailure::from),
            Route::Ignore => Ok(()),
            Route::Unsupported => Err(WorkerFailure::unsupported_action(
                self.session.protocol(),
                command,
            )),
        }
    }

    fn finalize(
        &mut self,
        class: Finalization,
        selector: Selector,
        outcome: WorkerResult,
    ) -> Result<(), ChannelError> {
        let failure = match outcome {
            Ok(()) => return self.report_success(class, selector),
            Err(failure) => failure,
        };
        self.session.discard_pending();
        if matches!(class, Finalization::Silent | Finalization::Status) {
            debug!(
                target: DISPATCH_TARGET,
                %selector,
                %failure,
                "silent operation failed"
            );
            return Ok(());
        }
        warn!(
            target: DISPATCH_TARGET,
            %selector,
            code = failure.code().get(),
            message = failure.message(),
            "operation failed"
        );
        let (reported_code, message) = failure.into_parts();
        let code = if reported_code == ErrorCode::new(0) {
            ErrorCode::INTERNAL
        } else {
            reported_code
        };
        self.session.send(&Notification::error(code, message))
    }

    fn report_success(
        &mut self,
        class: Finalization,
        selector: Selector,
    ) -> Result<(), ChannelError> {
        debug!(target: DISPATCH_TARGET, %selector, "operation succeeded");
        match class {
            Finalization::Report => {
                self.session.complete_stream(selector)?;
                self.session.flush_listing()?;
                self.session.flush_metadata(false)?;
                self.session.send(&Notification::Finished)
            }
            Finalization::Connect => self.session.send(&Notification::Connected),
            Finalization::ErrorOnly | Finalization::Silent | Finalization::Status => Ok(()),
        }
    }

    /// Serves commands until the session terminates.
    ///
    /// The loop ends on `exit`, when the controller closes the channel, or
    /// when the kill switch trips. While idle, an armed idle timer that
    /// expires dispatches its `special` payload. Malformed frames are
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Channel`] when the transport fails.
    pub fn run(&mut self) -> Result<(), WorkerError> {
        info!(
            target: DISPATCH_TARGET,
            protocol = self.session.protocol(),
            supported = ?self.table.supported(),
            "worker started"
        );
        while !self.session.is_terminating() {
            if self.session.was_killed() {
                info!(target: DISPATCH_TARGET, "worker killed");
                self.session.terminate();
                break;
            }
            let now = Instant::now();
            if let Some(payload) = self.session.take_due_timer(now) {
                debug!(target: TIMER_TARGET, "idle timer fired");
                self.dispatch_or_stop(Command::special(payload))?;
                continue;
            }
            let wait = self.session.idle_wait(now, IDLE_POLL_INTERVAL);
            match self.session.receive(Some(wait)) {
                Ok(Some(command)) => self.dispatch_or_stop(command)?,
                Ok(None) => {}
                Err(ChannelError::ConnectionLost) => {
                    info!(target: DISPATCH_TARGET, "controller closed the channel");
                    self.session.terminate();
                }
                Err(ChannelError::Malformed { message }) => {
                    warn!(target: DISPATCH_TARGET, %message, "skipping malformed frame");
                }
                Err(error) => return Err(error.into()),
            }
        }
        info!(target: DISPATCH_TARGET, "worker stopped");
        Ok(())
    }

    fn dispatch_or_stop(&mut self, command: Command) -> Result<(), WorkerError> {
        match self.dispatch(command) {
            Ok(()) => Ok(()),
            Err(ChannelError::ConnectionLost) => {
                info!(target: DISPATCH_TARGET, "controller went away mid-operation");
                self.session.terminate();
                Ok(())
            }
            Err(ChannelError::Malformed { message }) => {
                warn!(target: DISPATCH_TARGET, %message, "failed to encode notification");
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }
}
