//! `Content-Length` framing for protocol frames.
//!
//! Every frame on the channel looks like:
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <payload>
//! ```
//! The payload is one JSON document. Header lines other than
//! `Content-Length` are ignored. The reader distinguishes a clean close
//! between frames (`Ok(None)`) from a stream that ends mid-frame
//! ([`FrameError::Io`] with `UnexpectedEof`).

use std::io::{self, BufRead, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Largest payload accepted by [`FrameReader`].
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

const CONTENT_LENGTH: &str = "Content-Length:";

/// Errors raised while encoding or decoding frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Reading or writing the underlying stream failed.
    #[error("frame I/O error: {0}")]
    Io(#[from] io::Error),

    /// The header block ended without a `Content-Length` line.
    #[error("missing Content-Length header")]
    MissingContentLength,

    /// A `Content-Length` value could not be parsed.
    #[error("invalid frame header: {line}")]
    InvalidHeader {
        /// Offending header line.
        line: String,
    },

    /// The announced payload exceeds [`MAX_FRAME_LEN`].
    #[error("frame of {length} bytes exceeds the {limit} byte limit")]
    TooLarge {
        /// Announced length.
        length: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The payload could not be serialised.
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),

    /// The payload was not a valid frame body.
    #[error("failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),
}

impl FrameError {
    /// Returns `true` when the error means the peer has gone away.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Io(error) => matches!(
                error.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        }
    }

    /// Returns `true` when the stream is still aligned on a frame boundary.
    ///
    /// A decode failure consumed exactly one frame, so the next read starts
    /// cleanly. Header and I/O failures leave the stream in an unknown state.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// Reads frames from a buffered byte stream.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
}

impl<R: BufRead> FrameReader<R> {
    /// Wraps a buffered reader.
    #[must_use]
    pub const fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Reads one frame payload, blocking until it is complete.
    ///
    /// Returns `Ok(None)` when the stream closes cleanly between frames.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MissingContentLength`] or
    /// [`FrameError::InvalidHeader`] for a malformed header block,
    /// [`FrameError::TooLarge`] for an oversized frame, and
    /// [`FrameError::Io`] when the stream fails or ends mid-frame.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        let Some(length) = self.read_headers()? else {
            return Ok(None);
        };
        let mut payload = vec![0_u8; length];
        self.reader.read_exact(&mut payload)?;
        Ok(Some(payload))
    }

    /// Reads one frame and decodes its JSON payload.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::read_frame`], plus
    /// [`FrameError::Decode`] when the payload is not a valid `T`.
    pub fn read_message<T: DeserializeOwned>(&mut self) -> Result<Option<T>, FrameError> {
        let Some(payload) = self.read_frame()? else {
            return Ok(None);
        };
        serde_json::from_slice(&payload)
            .map(Some)
            .map_err(FrameError::Decode)
    }

    fn read_headers(&mut self) -> Result<Option<usize>, FrameError> {
        let mut content_length = None;
        let mut first_line = true;

        loop {
            let mut line = String::new();
            let bytes_read = self.reader.read_line(&mut line)?;
            if bytes_read == 0 {
                if first_line {
                    return Ok(None);
                }
                return Err(FrameError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream closed while reading frame headers",
                )));
            }
            first_line = false;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }
            if let Some(value) = trimmed.strip_prefix(CONTENT_LENGTH) {
                content_length = Some(parse_length(value.trim(), trimmed)?);
            }
        }

        content_length
            .map(Some)
            .ok_or(FrameError::MissingContentLength)
    }
}

fn parse_length(value: &str, line: &str) -> Result<usize, FrameError> {
    let length: usize = value.parse().map_err(|_| FrameError::InvalidHeader {
        line: line.to_owned(),
    })?;
    if length > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge {
            length,
            limit: MAX_FRAME_LEN,
        });
    }
    Ok(length)
}

/// Writes frames to a byte stream.
#[derive(Debug)]
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: Write> FrameWriter<W> {
    /// Wraps a writer.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one framed payload and flushes it.
    ///
    /// Header and payload are assembled first and handed to the writer in a
    /// single `write_all`, so a frame is never split across two callers.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Io`] if the stream rejects the bytes.
    pub fn write_frame(&mut self, payload: &[u8]) -> Result<(), FrameError> {
        let header = format!("{CONTENT_LENGTH} {}\r\n\r\n", payload.len());
        let mut frame = Vec::with_capacity(header.len() + payload.len());
        frame.extend_from_slice(header.as_bytes());
        frame.extend_from_slice(payload);
        self.writer.write_all(&frame)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Serialises `message` as JSON and writes it as one frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Encode`] if serialisation fails, or the errors
    /// of [`Self::write_frame`].
    pub fn write_message<T: Serialize>(&mut self, message: &T) -> Result<(), FrameError> {
        let payload = serde_json::to_vec(message).map_err(FrameError::Encode)?;
        self.write_frame(&payload)
    }

    /// Returns the wrapped writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}
