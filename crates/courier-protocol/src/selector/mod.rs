//! Selector codes naming every controller-to-worker frame.
//!
//! Selectors fall into three groups. *Operation* selectors start a unit of
//! work the dispatcher routes to a handler. *Answer* selectors are replies a
//! running handler waits for. *Control* selectors (`metadata`, `exit`) are
//! consumed by the engine itself.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Tag of a [`Command`](crate::Command) frame.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Selector {
    /// Open the backend connection.
    Connect,
    /// Drop the backend connection.
    CloseConnection,
    /// Configure the host the worker talks to.
    SetHost,
    /// Fetch a resource as a byte stream.
    Get,
    /// Store a resource from a byte stream.
    Put,
    /// Open a resource for random access.
    Open,
    /// Read from the open resource.
    Read,
    /// Write to the open resource.
    Write,
    /// Move the cursor of the open resource.
    Seek,
    /// Truncate the open resource.
    Truncate,
    /// Close the open resource.
    Close,
    /// Describe a resource.
    Stat,
    /// Determine the MIME type of a resource.
    Mimetype,
    /// Enumerate a directory.
    ListDir,
    /// Create a directory.
    Mkdir,
    /// Rename or move a resource.
    Rename,
    /// Create a symbolic link.
    Symlink,
    /// Change permissions.
    Chmod,
    /// Change ownership.
    Chown,
    /// Change the modification time.
    SetModificationTime,
    /// Copy a resource within the scheme.
    Copy,
    /// Delete a resource.
    Delete,
    /// Set the nested URL for filter schemes.
    SetSubUrl,
    /// Change the target of a symbolic link.
    SetLinkDest,
    /// Scheme-specific command with an opaque payload.
    Special,
    /// Fetch several resources in one operation.
    MultiGet,
    /// Report free and total space.
    FileSystemFreeSpace,
    /// Reload scheme configuration.
    ReparseConfiguration,
    /// Ask the worker to push its status.
    StatusQuery,
    /// Reserved extension command with a numeric id.
    Extension,
    /// Incoming metadata to merge into the worker's set.
    Metadata,
    /// Ask the worker to terminate.
    Exit,
    /// A chunk of upload data, or the empty end-of-stream marker.
    Data,
    /// Reply to a message box.
    MessageBoxAnswer,
    /// Reply to a credential prompt.
    CredentialAnswer,
    /// Reply to a host lookup.
    HostInfo,
    /// Reply to a resume offer.
    ResumeAnswer,
    /// Reply to a privilege request.
    PrivilegeAnswer,
}

impl Selector {
    /// Returns `true` for selectors that start an operation.
    #[must_use]
    pub const fn is_operation(self) -> bool {
        !self.is_answer() && !self.is_control()
    }

    /// Returns `true` for replies consumed by a waiting handler.
    #[must_use]
    pub const fn is_answer(self) -> bool {
        matches!(
            self,
            Self::Data
                | Self::MessageBoxAnswer
                | Self::CredentialAnswer
                | Self::HostInfo
                | Self::ResumeAnswer
                | Self::PrivilegeAnswer
        )
    }

    /// Returns `true` for frames the engine consumes without a handler.
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, Self::Metadata | Self::Exit)
    }
}

#[cfg(test)]
mod tests;
