//! The command channel between a worker and its controller.
//!
//! A [`Channel`] moves whole frames: the worker sends [`Notification`]s and
//! receives [`Command`]s. Implementations guarantee framing and per-direction
//! ordering and nothing else. They never look inside a frame.
//!
//! Two implementations ship with the crate. [`StreamChannel`] speaks the
//! `Content-Length` framed wire format over stdio or a socket.
//! [`MemoryChannel`] passes frames through in-process queues and pairs with a
//! [`ControllerHandle`] for embedding and tests.

use std::io;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use courier_protocol::{Command, FrameError, Notification};
use thiserror::Error;

mod memory;
mod stream;

pub use self::memory::{ControllerHandle, MemoryChannel};
pub use self::stream::StreamChannel;

pub(crate) const CHANNEL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::channel");

/// Bidirectional frame transport as seen from the worker.
pub trait Channel: Send {
    /// Sends one complete frame to the controller.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::ConnectionLost`] when the controller has gone
    /// away, or [`ChannelError::Io`] when the transport fails.
    fn send(&mut self, notification: &Notification) -> Result<(), ChannelError>;

    /// Blocks until the next frame arrives.
    ///
    /// With `Some(timeout)`, returns `Ok(None)` if nothing arrived in time.
    /// With `None`, waits indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::ConnectionLost`] once the controller closes
    /// the channel, [`ChannelError::Malformed`] for an undecodable frame, or
    /// [`ChannelError::Io`] when the transport fails.
    fn receive(&mut self, timeout: Option<Duration>) -> Result<Option<Command>, ChannelError>;
}

/// Errors raised by a [`Channel`].
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    /// The controller closed its end of the channel.
    #[error("connection to the controller was lost")]
    ConnectionLost,

    /// The transport failed.
    #[error("channel I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// A frame arrived that could not be decoded.
    #[error("malformed frame: {message}")]
    Malformed {
        /// Decoder diagnostic.
        message: String,
    },
}

impl ChannelError {
    /// Wraps an I/O error.
    #[must_use]
    pub fn io(source: io::Error) -> Self {
        Self::Io {
            source: Arc::new(source),
        }
    }

    /// Builds a malformed-frame error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Returns `true` when the controller has gone away.
    #[must_use]
    pub const fn is_connection_lost(&self) -> bool {
        matches!(self, Self::ConnectionLost)
    }
}

impl From<FrameError> for ChannelError {
    fn from(error: FrameError) -> Self {
        if error.is_disconnect() {
            return Self::ConnectionLost;
        }
        match error {
            FrameError::Io(source) => Self::io(source),
            other => Self::malformed(other.to_string()),
        }
    }
}

/// Receives from an in-process queue, mapping a dropped sender to
/// [`ChannelError::ConnectionLost`].
pub(crate) fn receive_from<T>(
    queue: &Receiver<T>,
    timeout: Option<Duration>,
) -> Result<Option<T>, ChannelError> {
    match timeout {
        None => queue
            .recv()
            .map(Some)
            .map_err(|_| ChannelError::ConnectionLost),
        Some(limit) => match queue.recv_timeout(limit) {
            Ok(item) => Ok(Some(item)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(ChannelError::ConnectionLost),
        },
    }
}
