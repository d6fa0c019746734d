//! Wire vocabulary for the courier worker protocol.
//!
//! A worker serves one URL scheme and talks to its controller over a single
//! bidirectional channel. Controller-to-worker frames are [`Command`]s: either
//! operations to dispatch or answers to a question the worker asked while an
//! operation was running. Worker-to-controller frames are [`Notification`]s.
//!
//! Frames are JSON documents carried inside `Content-Length` framing (see
//! [`codec`]). Byte payloads travel as base64 strings.
//!
//! # Example
//!
//! ```
//! use courier_protocol::{Command, Selector};
//!
//! let command: Command = serde_json::from_str(r#"{"selector":"connect"}"#).unwrap();
//! assert_eq!(command.selector(), Selector::Connect);
//! ```

mod base64_bytes;
pub mod codec;
pub mod command;
pub mod error_code;
pub mod notification;
pub mod records;
pub mod selector;

pub use self::codec::{FrameError, FrameReader, FrameWriter, MAX_FRAME_LEN};
pub use self::command::Command;
pub use self::error_code::ErrorCode;
pub use self::notification::Notification;
pub use self::records::{
    AuthInfo, ButtonCode, Entry, EntryKind, HostInfo, JobFlags, MessageBoxRequest,
    MessageBoxType, OpenMode, PrivilegeStatus,
};
pub use self::selector::Selector;
