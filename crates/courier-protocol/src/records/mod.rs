//! Structured records carried inside commands and notifications.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use url::Url;

/// Kind of resource described by an [`Entry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
}

/// One stat or listing record.
///
/// # Example
///
/// ```
/// use courier_protocol::{Entry, EntryKind};
///
/// let entry = Entry::file("notes.txt", 42).with_permissions(0o644);
/// assert_eq!(entry.kind(), EntryKind::File);
/// assert_eq!(entry.size(), 42);
/// assert_eq!(entry.permissions(), Some(0o644));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    name: String,
    kind: EntryKind,
    size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    permissions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    link_dest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
}

impl Entry {
    fn new(name: impl Into<String>, kind: EntryKind, size: u64) -> Self {
        Self {
            name: name.into(),
            kind,
            size,
            modified: None,
            permissions: None,
            owner: None,
            group: None,
            link_dest: None,
            mime_type: None,
        }
    }

    /// Describes a regular file of `size` bytes.
    #[must_use]
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self::new(name, EntryKind::File, size)
    }

    /// Describes a directory.
    #[must_use]
    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Directory, 0)
    }

    /// Describes a symbolic link pointing at `target`.
    #[must_use]
    pub fn symlink(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut entry = Self::new(name, EntryKind::Symlink, 0);
        entry.link_dest = Some(target.into());
        entry
    }

    /// Sets the modification time in seconds since the Unix epoch.
    #[must_use]
    pub const fn with_modified(mut self, seconds: i64) -> Self {
        self.modified = Some(seconds);
        self
    }

    /// Sets the permission bits.
    #[must_use]
    pub const fn with_permissions(mut self, permissions: u32) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Sets the owning user and group.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>, group: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self.group = Some(group.into());
        self
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Returns the entry name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the entry kind.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Returns the size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns the modification time, if known.
    #[must_use]
    pub const fn modified(&self) -> Option<i64> {
        self.modified
    }

    /// Returns the permission bits, if known.
    #[must_use]
    pub const fn permissions(&self) -> Option<u32> {
        self.permissions
    }

    /// Returns the owning user, if known.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Returns the owning group, if known.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Returns the link target for symbolic links.
    #[must_use]
    pub fn link_dest(&self) -> Option<&str> {
        self.link_dest.as_deref()
    }

    /// Returns the MIME type, if known.
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }
}

/// Flags modifying copy, move and upload operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFlags {
    /// Replace an existing destination.
    #[serde(default)]
    pub overwrite: bool,
    /// Continue a partial transfer.
    #[serde(default)]
    pub resume: bool,
}

impl JobFlags {
    /// Flags with `overwrite` set.
    #[must_use]
    pub const fn overwrite() -> Self {
        Self {
            overwrite: true,
            resume: false,
        }
    }

    /// Flags with `resume` set.
    #[must_use]
    pub const fn resume() -> Self {
        Self {
            overwrite: false,
            resume: true,
        }
    }
}

/// Access mode for `open`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Read only.
    #[default]
    Read,
    /// Write only, truncating existing content.
    Write,
    /// Read and write.
    ReadWrite,
    /// Write at the end of existing content.
    Append,
}

impl OpenMode {
    /// Returns `true` when the mode permits writing.
    #[must_use]
    pub const fn is_write(self) -> bool {
        !matches!(self, Self::Read)
    }
}

/// Credentials exchanged with the controller's prompt and the auth store.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    /// Resource the credentials apply to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    /// User name.
    #[serde(default)]
    pub username: String,
    /// Password.
    #[serde(default)]
    pub password: String,
    /// Authentication realm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
    /// Prompt text shown to the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Dialog caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Ask the credential store to remember the password.
    #[serde(default)]
    pub keep_password: bool,
    /// Prevent the user from editing the user name.
    #[serde(default)]
    pub read_only_username: bool,
}

impl AuthInfo {
    /// Creates a request for credentials protecting `url`.
    #[must_use]
    pub fn for_url(url: Url) -> Self {
        Self {
            url: Some(url),
            ..Self::default()
        }
    }
}

impl fmt::Debug for AuthInfo {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthInfo")
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("realm", &self.realm)
            .field("keep_password", &self.keep_password)
            .finish_non_exhaustive()
    }
}

/// Result of a host lookup performed by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    /// Name that was looked up.
    pub hostname: String,
    /// Resolved addresses, empty on failure.
    #[serde(default)]
    pub addresses: Vec<IpAddr>,
    /// Resolver error text, when resolution failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HostInfo {
    /// Returns `true` when at least one address resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !self.addresses.is_empty()
    }
}

/// Dialog flavour for a message box question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageBoxType {
    /// Question with two actions.
    QuestionTwoActions,
    /// Warning with two actions.
    WarningTwoActions,
    /// Warning with continue and cancel.
    WarningContinueCancel,
    /// Warning with two actions and cancel.
    WarningTwoActionsCancel,
    /// Plain information.
    Information,
    /// TLS certificate details.
    Ssl,
    /// Warning with continue, cancel and a details section.
    WarningContinueCancelDetailed,
}

/// Button the user chose in a message box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonCode {
    /// Acknowledged.
    Ok,
    /// Dismissed.
    Cancel,
    /// First action.
    PrimaryAction,
    /// Second action.
    SecondaryAction,
    /// Continue.
    Continue,
}

/// Question shown through the controller's message box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBoxRequest {
    /// Dialog flavour.
    pub box_type: MessageBoxType,
    /// Body text.
    pub text: String,
    /// Dialog title.
    #[serde(default)]
    pub title: String,
    /// Label of the primary action button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_action: Option<String>,
    /// Label of the secondary action button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_action: Option<String>,
    /// Key under which a "don't ask again" choice is stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dont_ask_again: Option<String>,
}

impl MessageBoxRequest {
    /// Creates a message box with no title or custom labels.
    #[must_use]
    pub fn new(box_type: MessageBoxType, text: impl Into<String>) -> Self {
        Self {
            box_type,
            text: text.into(),
            title: String::new(),
            primary_action: None,
            secondary_action: None,
            dont_ask_again: None,
        }
    }

    /// Sets the dialog title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets custom labels for the two action buttons.
    #[must_use]
    pub fn with_actions(
        mut self,
        primary: impl Into<String>,
        secondary: impl Into<String>,
    ) -> Self {
        self.primary_action = Some(primary.into());
        self.secondary_action = Some(secondary.into());
        self
    }
}

/// Verdict of the privilege broker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeStatus {
    /// The privileged operation may proceed.
    Granted,
    /// The privileged operation was refused.
    Denied,
    /// No verdict could be obtained.
    #[default]
    Unknown,
}

#[cfg(test)]
mod tests;
