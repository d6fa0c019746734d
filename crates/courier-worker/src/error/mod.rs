//! Infrastructure errors raised by the engine.
//!
//! These never reach the controller directly. Handler outcomes travel as
//! [`WorkerFailure`](crate::WorkerFailure); the types here describe why the
//! engine itself could not do its job.

use std::io;
use std::sync::Arc;

use courier_protocol::Selector;
use thiserror::Error;

use crate::channel::ChannelError;
use crate::session::PendingAnswer;
use crate::telemetry::TelemetryError;

/// Failure of a nested wait in the answer sub-protocol.
#[derive(Debug, Clone, Error)]
pub enum AnswerError {
    /// The controller sent a frame the pending wait does not accept.
    #[error("expected {expected} but the controller sent {received}")]
    Mismatch {
        /// Selectors the wait accepted.
        expected: PendingAnswer,
        /// Selector that actually arrived.
        received: Selector,
    },

    /// The channel closed before a reply arrived.
    #[error("connection lost while waiting for {expected}")]
    ConnectionLost {
        /// Selectors the wait accepted.
        expected: PendingAnswer,
    },

    /// The worker was killed while waiting.
    #[error("worker killed while waiting for {expected}")]
    Killed {
        /// Selectors the wait accepted.
        expected: PendingAnswer,
    },

    /// The channel failed while sending the question or reading the reply.
    #[error("channel failure during answer exchange: {0}")]
    Channel(#[from] ChannelError),
}

impl AnswerError {
    /// Returns `true` when the controller has gone away.
    #[must_use]
    pub const fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            Self::ConnectionLost { .. } | Self::Channel(ChannelError::ConnectionLost)
        )
    }
}

/// Errors that stop a worker from running.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The channel failed in a way the loop cannot recover from.
    #[error("channel failed: {0}")]
    Channel(#[from] ChannelError),

    /// Connecting to the controller failed.
    #[error("failed to open channel to {endpoint}: {source}")]
    Connect {
        /// Endpoint that was dialled.
        endpoint: String,
        /// Underlying channel error.
        #[source]
        source: ChannelError,
    },

    /// Installing termination signal handlers failed.
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] Arc<io::Error>),

    /// The background worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] Arc<io::Error>),

    /// The background worker thread panicked.
    #[error("worker thread panicked")]
    ThreadPanicked,

    /// Telemetry could not be initialised.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

impl WorkerError {
    /// Returns the process exit status for this error.
    ///
    /// Runtime channel failures return status 1. Startup failures return
    /// status 2.
    #[must_use]
    pub const fn exit_status(&self) -> i32 {
        match self {
            Self::Channel(_) | Self::ThreadPanicked => 1,
            Self::Connect { .. } | Self::Signals(_) | Self::Spawn(_) | Self::Telemetry(_) => 2,
        }
    }

    /// Creates a connection error for `endpoint`.
    pub fn connect(endpoint: impl ToString, source: ChannelError) -> Self {
        Self::Connect {
            endpoint: endpoint.to_string(),
            source,
        }
    }

    /// Creates a signal installation error.
    #[must_use]
    pub fn signals(source: io::Error) -> Self {
        Self::Signals(Arc::new(source))
    }

    /// Creates a thread spawn error.
    #[must_use]
    pub fn spawn(source: io::Error) -> Self {
        Self::Spawn(Arc::new(source))
    }
}

#[cfg(test)]
mod tests;
