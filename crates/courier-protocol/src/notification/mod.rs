//! Worker-to-controller frames.
//!
//! Only `finished`, `error`, `connected` and `status` close out an
//! operation. Everything else is progress, payload or a question frame
//! belonging to the answer sub-protocol.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error_code::ErrorCode;
use crate::records::{AuthInfo, Entry, MessageBoxRequest};

/// A frame sent by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Download chunk; empty marks end of stream.
    Data {
        /// Chunk bytes.
        #[serde(with = "crate::base64_bytes")]
        data: Vec<u8>,
    },
    /// Request the next upload chunk.
    DataReq,
    /// The operation completed.
    Finished,
    /// The operation failed.
    Error {
        /// Code from the shared error space.
        code: ErrorCode,
        /// Human-readable detail.
        message: String,
    },
    /// The backend connection is open.
    Connected,
    /// Total size of the transfer.
    TotalSize {
        /// Bytes.
        size: u64,
    },
    /// Bytes processed so far.
    ProcessedSize {
        /// Bytes.
        size: u64,
    },
    /// Cursor position of the open resource.
    Position {
        /// Absolute offset.
        offset: u64,
    },
    /// Bytes written to the open resource.
    Written {
        /// Bytes.
        bytes: u64,
    },
    /// The open resource was truncated.
    Truncated {
        /// New length.
        length: u64,
    },
    /// Current transfer speed.
    Speed {
        /// Bytes per second.
        bytes_per_second: u64,
    },
    /// The resource moved.
    Redirection {
        /// New location.
        url: Url,
    },
    /// Detected MIME type of the resource being fetched.
    MimeType {
        /// MIME type.
        mime_type: String,
    },
    /// Non-fatal warning.
    Warning {
        /// Warning text.
        message: String,
    },
    /// Informational status line.
    InfoMessage {
        /// Message text.
        message: String,
    },
    /// Result of `stat`.
    StatEntry {
        /// Described resource.
        entry: Entry,
    },
    /// A batch of directory entries.
    ListEntries {
        /// Entries in backend order.
        entries: Vec<Entry>,
    },
    /// Outgoing metadata.
    MetaData {
        /// Key/value pairs.
        entries: BTreeMap<String, String>,
    },
    /// Reply to `status-query`.
    Status {
        /// Host the worker is attached to, empty when none.
        host: String,
        /// Whether a backend connection is open.
        connected: bool,
    },
    /// A filter scheme needs data from its nested URL.
    NeedSubUrlData,
    /// The data that follows is an error page.
    ErrorPage,
    /// Offer to resume a transfer at `offset`.
    CanResume {
        /// Resume offset.
        offset: u64,
    },
    /// Ask the user a question.
    MessageBox {
        /// Question to show.
        request: MessageBoxRequest,
    },
    /// Ask the user for credentials.
    CredentialPrompt {
        /// Credentials to fill in.
        auth: AuthInfo,
        /// Error shown above the prompt, empty on the first attempt.
        #[serde(default)]
        error_message: String,
    },
    /// Ask the controller to resolve a host name.
    HostLookup {
        /// Name to resolve.
        hostname: String,
    },
    /// Ask the privilege broker about an operation.
    PrivilegeRequest {
        /// Description of the privileged operation.
        details: String,
    },
}

impl Notification {
    /// Builds an error frame.
    #[must_use]
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    /// Builds a download chunk frame.
    #[must_use]
    pub fn data(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Data { data: bytes.into() }
    }

    /// Returns `true` for the empty end-of-stream data frame.
    #[must_use]
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Self::Data { data } if data.is_empty())
    }

    /// Returns `true` for frames that close out an operation.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finished | Self::Error { .. } | Self::Connected | Self::Status { .. }
        )
    }
}

#[cfg(test)]
mod tests;
