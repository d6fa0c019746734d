//! Controller-to-worker frames.
//!
//! Commands are immutable once received. Each variant's tag on the wire is
//! its [`Selector`] spelled in kebab-case.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::records::{AuthInfo, ButtonCode, HostInfo, JobFlags, OpenMode, PrivilegeStatus};
use crate::selector::Selector;

/// A frame sent by the controller.
///
/// # Example
///
/// ```
/// use courier_protocol::{Command, JobFlags, Selector};
///
/// let json = r#"{"selector":"rename","src":"memfs:/a","dest":"memfs:/b","flags":{}}"#;
/// let command: Command = serde_json::from_str(json).unwrap();
/// assert_eq!(command.selector(), Selector::Rename);
/// assert!(matches!(command, Command::Rename { flags, .. } if flags == JobFlags::default()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "selector", rename_all = "kebab-case")]
pub enum Command {
    /// Open the backend connection.
    Connect,
    /// Drop the backend connection.
    CloseConnection,
    /// Configure the host the worker talks to.
    SetHost {
        /// Host name.
        host: String,
        /// Port, zero for the scheme default.
        #[serde(default)]
        port: u16,
        /// User name.
        #[serde(default)]
        user: String,
        /// Password.
        #[serde(default)]
        password: String,
    },
    /// Fetch a resource as a byte stream.
    Get {
        /// Resource to fetch.
        url: Url,
    },
    /// Store a resource from a byte stream pulled with `data_req`.
    Put {
        /// Resource to store.
        url: Url,
        /// Permission bits for a new resource.
        #[serde(default)]
        permissions: Option<u32>,
        /// Overwrite and resume flags.
        #[serde(default)]
        flags: JobFlags,
    },
    /// Open a resource for random access.
    Open {
        /// Resource to open.
        url: Url,
        /// Access mode.
        #[serde(default)]
        mode: OpenMode,
    },
    /// Read up to `size` bytes from the open resource.
    Read {
        /// Maximum number of bytes.
        size: u64,
    },
    /// Write bytes to the open resource.
    Write {
        /// Bytes to write.
        #[serde(with = "crate::base64_bytes")]
        data: Vec<u8>,
    },
    /// Move the cursor of the open resource.
    Seek {
        /// Absolute offset.
        offset: u64,
    },
    /// Truncate the open resource.
    Truncate {
        /// New length in bytes.
        length: u64,
    },
    /// Close the open resource.
    Close,
    /// Describe a resource.
    Stat {
        /// Resource to describe.
        url: Url,
    },
    /// Determine the MIME type of a resource.
    Mimetype {
        /// Resource to inspect.
        url: Url,
    },
    /// Enumerate a directory.
    ListDir {
        /// Directory to list.
        url: Url,
    },
    /// Create a directory.
    Mkdir {
        /// Directory to create.
        url: Url,
        /// Permission bits.
        #[serde(default)]
        permissions: Option<u32>,
    },
    /// Rename or move a resource.
    Rename {
        /// Existing resource.
        src: Url,
        /// New location.
        dest: Url,
        /// Overwrite flag.
        #[serde(default)]
        flags: JobFlags,
    },
    /// Create a symbolic link at `dest` pointing to `target`.
    Symlink {
        /// Link target, stored verbatim.
        target: String,
        /// Location of the new link.
        dest: Url,
        /// Overwrite flag.
        #[serde(default)]
        flags: JobFlags,
    },
    /// Change permissions.
    Chmod {
        /// Resource to change.
        url: Url,
        /// New permission bits.
        permissions: u32,
    },
    /// Change ownership.
    Chown {
        /// Resource to change.
        url: Url,
        /// New owning user.
        owner: String,
        /// New owning group.
        group: String,
    },
    /// Change the modification time.
    SetModificationTime {
        /// Resource to change.
        url: Url,
        /// Seconds since the Unix epoch.
        mtime: i64,
    },
    /// Copy a resource within the scheme.
    Copy {
        /// Source resource.
        src: Url,
        /// Destination resource.
        dest: Url,
        /// Permission bits for the copy.
        #[serde(default)]
        permissions: Option<u32>,
        /// Overwrite flag.
        #[serde(default)]
        flags: JobFlags,
    },
    /// Delete a resource.
    Delete {
        /// Resource to delete.
        url: Url,
        /// `true` for files, `false` for directories.
        #[serde(default = "default_true")]
        is_file: bool,
    },
    /// Set the nested URL for filter schemes.
    SetSubUrl {
        /// Nested resource.
        url: Url,
    },
    /// Change the target of a symbolic link.
    SetLinkDest {
        /// Link to change.
        url: Url,
        /// New target.
        target: String,
    },
    /// Scheme-specific command with an opaque payload.
    Special {
        /// Opaque payload.
        #[serde(with = "crate::base64_bytes")]
        data: Vec<u8>,
    },
    /// Fetch several resources in one operation.
    MultiGet {
        /// Resources to fetch, in order.
        urls: Vec<Url>,
    },
    /// Report free and total space.
    FileSystemFreeSpace {
        /// Any resource on the filesystem in question.
        url: Url,
    },
    /// Reload scheme configuration.
    ReparseConfiguration,
    /// Ask the worker to push its status.
    StatusQuery,
    /// Reserved extension command.
    Extension {
        /// Extension id.
        id: u32,
        /// Opaque payload.
        #[serde(with = "crate::base64_bytes")]
        data: Vec<u8>,
    },
    /// Incoming metadata merged into the worker's set.
    Metadata {
        /// Key/value pairs; later frames win per key.
        entries: BTreeMap<String, String>,
    },
    /// Ask the worker to terminate.
    Exit,
    /// Upload chunk; empty marks end of stream.
    Data {
        /// Chunk bytes.
        #[serde(with = "crate::base64_bytes")]
        data: Vec<u8>,
    },
    /// Reply to a message box.
    MessageBoxAnswer {
        /// Button the user chose.
        button: ButtonCode,
    },
    /// Reply to a credential prompt.
    CredentialAnswer {
        /// Credentials entered, absent when the prompt was cancelled.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auth: Option<AuthInfo>,
    },
    /// Reply to a host lookup.
    HostInfo {
        /// Lookup outcome.
        info: HostInfo,
    },
    /// Reply to a resume offer.
    ResumeAnswer {
        /// Whether the controller accepted the offset.
        accepted: bool,
    },
    /// Reply to a privilege request.
    PrivilegeAnswer {
        /// Broker verdict.
        status: PrivilegeStatus,
    },
}

const fn default_true() -> bool {
    true
}

impl Command {
    /// Returns the selector tagging this frame.
    #[must_use]
    pub const fn selector(&self) -> Selector {
        match self {
            Self::Connect => Selector::Connect,
            Self::CloseConnection => Selector::CloseConnection,
            Self::SetHost { .. } => Selector::SetHost,
            Self::Get { .. } => Selector::Get,
            Self::Put { .. } => Selector::Put,
            Self::Open { .. } => Selector::Open,
            Self::Read { .. } => Selector::Read,
            Self::Write { .. } => Selector::Write,
            Self::Seek { .. } => Selector::Seek,
            Self::Truncate { .. } => Selector::Truncate,
            Self::Close => Selector::Close,
            Self::Stat { .. } => Selector::Stat,
            Self::Mimetype { .. } => Selector::Mimetype,
            Self::ListDir { .. } => Selector::ListDir,
            Self::Mkdir { .. } => Selector::Mkdir,
            Self::Rename { .. } => Selector::Rename,
            Self::Symlink { .. } => Selector::Symlink,
            Self::Chmod { .. } => Selector::Chmod,
            Self::Chown { .. } => Selector::Chown,
            Self::SetModificationTime { .. } => Selector::SetModificationTime,
            Self::Copy { .. } => Selector::Copy,
            Self::Delete { .. } => Selector::Delete,
            Self::SetSubUrl { .. } => Selector::SetSubUrl,
            Self::SetLinkDest { .. } => Selector::SetLinkDest,
            Self::Special { .. } => Selector::Special,
            Self::MultiGet { .. } => Selector::MultiGet,
            Self::FileSystemFreeSpace { .. } => Selector::FileSystemFreeSpace,
            Self::ReparseConfiguration => Selector::ReparseConfiguration,
            Self::StatusQuery => Selector::StatusQuery,
            Self::Extension { .. } => Selector::Extension,
            Self::Metadata { .. } => Selector::Metadata,
            Self::Exit => Selector::Exit,
            Self::Data { .. } => Selector::Data,
            Self::MessageBoxAnswer { .. } => Selector::MessageBoxAnswer,
            Self::CredentialAnswer { .. } => Selector::CredentialAnswer,
            Self::HostInfo { .. } => Selector::HostInfo,
            Self::ResumeAnswer { .. } => Selector::ResumeAnswer,
            Self::PrivilegeAnswer { .. } => Selector::PrivilegeAnswer,
        }
    }

    /// Returns the primary URL for URL-addressed operations.
    #[must_use]
    pub const fn url(&self) -> Option<&Url> {
        match self {
            Self::Get { url }
            | Self::Put { url, .. }
            | Self::Open { url, .. }
            | Self::Stat { url }
            | Self::Mimetype { url }
            | Self::ListDir { url }
            | Self::Mkdir { url, .. }
            | Self::Chmod { url, .. }
            | Self::Chown { url, .. }
            | Self::SetModificationTime { url, .. }
            | Self::Delete { url, .. }
            | Self::SetSubUrl { url }
            | Self::SetLinkDest { url, .. }
            | Self::FileSystemFreeSpace { url } => Some(url),
            Self::Rename { src, .. } | Self::Copy { src, .. } => Some(src),
            Self::Symlink { dest, .. } => Some(dest),
            _ => None,
        }
    }

    /// Builds an upload chunk frame.
    #[must_use]
    pub fn data(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Data { data: bytes.into() }
    }

    /// Builds the empty end-of-stream upload frame.
    #[must_use]
    pub const fn end_of_data() -> Self {
        Self::Data { data: Vec::new() }
    }

    /// Builds a `special` frame carrying `payload`.
    #[must_use]
    pub fn special(payload: impl Into<Vec<u8>>) -> Self {
        Self::Special {
            data: payload.into(),
        }
    }
}

#[cfg(test)]
mod tests;
