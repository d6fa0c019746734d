//! Shared error-code space for failed operations.
//!
//! Codes start at 101 so they never collide with the zero "no error" value
//! and keep the numbering controllers of the worker-base protocol expect.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric error code carried by an `error` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(i32);

impl ErrorCode {
    /// The file could not be opened for reading.
    pub const CANNOT_OPEN_FOR_READING: Self = Self(101);
    /// The file could not be opened for writing.
    pub const CANNOT_OPEN_FOR_WRITING: Self = Self(102);
    /// Internal worker fault.
    pub const INTERNAL: Self = Self(104);
    /// The URL was malformed.
    pub const MALFORMED_URL: Self = Self(105);
    /// The scheme is not served by this worker.
    pub const UNSUPPORTED_PROTOCOL: Self = Self(106);
    /// The worker does not implement the requested selector.
    pub const UNSUPPORTED_ACTION: Self = Self(108);
    /// A directory was found where a file was expected.
    pub const IS_DIRECTORY: Self = Self(109);
    /// A file was found where a directory was expected.
    pub const IS_FILE: Self = Self(110);
    /// The resource does not exist.
    pub const DOES_NOT_EXIST: Self = Self(111);
    /// A file already exists at the destination.
    pub const FILE_ALREADY_EXIST: Self = Self(112);
    /// A directory already exists at the destination.
    pub const DIR_ALREADY_EXIST: Self = Self(113);
    /// Host name could not be resolved.
    pub const UNKNOWN_HOST: Self = Self(114);
    /// Access to the resource was refused.
    pub const ACCESS_DENIED: Self = Self(115);
    /// Write access to the resource was refused.
    pub const WRITE_ACCESS_DENIED: Self = Self(116);
    /// The directory could not be entered.
    pub const CANNOT_ENTER_DIRECTORY: Self = Self(117);
    /// The user cancelled the operation.
    pub const USER_CANCELED: Self = Self(120);
    /// Connecting to the backend failed.
    pub const COULD_NOT_CONNECT: Self = Self(123);
    /// An established backend connection broke.
    pub const CONNECTION_BROKEN: Self = Self(124);
    /// Reading from the backend failed.
    pub const COULD_NOT_READ: Self = Self(128);
    /// Writing to the backend failed.
    pub const COULD_NOT_WRITE: Self = Self(129);
    /// Login was refused.
    pub const COULD_NOT_LOGIN: Self = Self(133);
    /// The resource could not be stat'ed.
    pub const COULD_NOT_STAT: Self = Self(134);
    /// The directory could not be created.
    pub const CANNOT_MKDIR: Self = Self(137);
    /// The directory could not be removed.
    pub const CANNOT_RMDIR: Self = Self(138);
    /// The transfer cannot be resumed.
    pub const CANNOT_RESUME: Self = Self(139);
    /// The resource could not be renamed.
    pub const CANNOT_RENAME: Self = Self(140);
    /// Permissions could not be changed.
    pub const CANNOT_CHMOD: Self = Self(141);
    /// The resource could not be deleted.
    pub const CANNOT_DELETE: Self = Self(142);
    /// The worker exchange with the controller broke down.
    pub const COMMUNICATION_FAILURE: Self = Self(143);
    /// The operation was aborted.
    pub const ABORTED: Self = Self(147);
    /// The backend timed out.
    pub const SERVER_TIMEOUT: Self = Self(149);
    /// A symbolic link could not be created.
    pub const CANNOT_SYMLINK: Self = Self(158);
    /// The backend ran out of space.
    pub const DISK_FULL: Self = Self(160);
    /// Seeking within an open file failed.
    pub const CANNOT_SEEK: Self = Self(165);
    /// The modification time could not be set.
    pub const CANNOT_SETTIME: Self = Self(166);
    /// Ownership could not be changed.
    pub const CANNOT_CHOWN: Self = Self(167);
    /// Truncating an open file failed.
    pub const CANNOT_TRUNCATE: Self = Self(175);

    /// Wraps a raw code, for scheme-specific codes outside the named set.
    #[must_use]
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    /// Returns the raw integer code.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}
