//! Payload streaming in both directions.
//!
//! Downloads push `data` frames and finish with one empty frame. Uploads
//! pull: the handler sends `data_req` and the controller answers with one
//! `data` command, where an empty chunk marks the end of the upload.

use courier_protocol::{Command, Notification, Selector};
use tracing::{trace, warn};

use super::{PendingAnswer, SESSION_TARGET, Session, SessionState};
use crate::channel::ChannelError;
use crate::error::AnswerError;

/// Direction of a payload stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Controller to worker (`put`, `write`).
    Inbound,
    /// Worker to controller (`get`, `read`).
    Outbound,
}

/// Per-operation record of what has been streamed.
#[derive(Debug, Default)]
pub(super) struct StreamTracker {
    outbound_started: bool,
    outbound_finished: bool,
    inbound_finished: bool,
    bytes: u64,
}

impl StreamTracker {
    fn record(&mut self, len: usize) -> u64 {
        self.bytes = self
            .bytes
            .saturating_add(u64::try_from(len).unwrap_or(u64::MAX));
        self.bytes
    }
}

impl Session {
    /// Sends one chunk of the resource to the controller.
    ///
    /// Pending outgoing metadata is flushed before the first chunk. An empty
    /// chunk marks the end of the stream; chunks after that are dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if a frame cannot be sent.
    pub fn data(&mut self, chunk: &[u8]) -> Result<(), ChannelError> {
        if self.stream.outbound_finished {
            warn!(
                target: SESSION_TARGET,
                len = chunk.len(),
                "dropping data sent after end of stream"
            );
            return Ok(());
        }
        if !self.stream.outbound_started {
            self.flush_metadata(false)?;
            self.stream.outbound_started = true;
        }
        if chunk.is_empty() {
            self.stream.outbound_finished = true;
        }
        let bytes = self.stream.record(chunk.len());
        self.state = SessionState::Streaming {
            direction: Direction::Outbound,
            bytes,
        };
        trace!(target: SESSION_TARGET, len = chunk.len(), "data");
        self.send(&Notification::data(chunk.to_vec()))
    }

    /// Marks the end of the outbound stream.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn end_of_data(&mut self) -> Result<(), ChannelError> {
        self.data(&[])
    }

    /// Returns `true` once the outbound stream has been terminated.
    #[must_use]
    pub const fn outbound_finished(&self) -> bool {
        self.stream.outbound_finished
    }

    /// Asks the controller for the next upload chunk.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn data_req(&mut self) -> Result<(), ChannelError> {
        self.send(&Notification::DataReq)
    }

    /// Waits for the controller's next `data` command.
    ///
    /// Returns `Some(chunk)` for a non-empty chunk and `None` once the
    /// upload has ended. After the end every call returns `None` without
    /// touching the channel.
    ///
    /// # Errors
    ///
    /// Returns an [`AnswerError`] if the controller sends something else,
    /// goes away, or the worker is killed.
    pub fn read_data(&mut self) -> Result<Option<Vec<u8>>, AnswerError> {
        if self.stream.inbound_finished {
            return Ok(None);
        }
        let answer = self.wait_for_answer(PendingAnswer::one(Selector::Data))?;
        let Command::Data { data } = answer.into_command() else {
            return Ok(None);
        };
        if data.is_empty() {
            self.stream.inbound_finished = true;
            return Ok(None);
        }
        let bytes = self.stream.record(data.len());
        self.state = SessionState::Streaming {
            direction: Direction::Inbound,
            bytes,
        };
        Ok(Some(data))
    }

    /// Requests and reads the next upload chunk.
    ///
    /// # Errors
    ///
    /// Returns an [`AnswerError`] if the request cannot be sent or the reply
    /// is not a `data` command.
    pub fn next_upload_chunk(&mut self) -> Result<Option<Vec<u8>>, AnswerError> {
        if self.stream.inbound_finished {
            return Ok(None);
        }
        self.data_req()?;
        self.read_data()
    }

    /// Closes the outbound stream of a successful operation.
    ///
    /// `get` and `mimetype` always end with an empty chunk, as does any
    /// operation that started sending data.
    pub(crate) fn complete_stream(&mut self, selector: Selector) -> Result<(), ChannelError> {
        let needs_marker = matches!(selector, Selector::Get | Selector::Mimetype)
            || self.stream.outbound_started;
        if needs_marker && !self.stream.outbound_finished {
            return self.end_of_data();
        }
        Ok(())
    }
}
