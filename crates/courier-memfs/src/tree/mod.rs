//! The in-memory filesystem served by the worker.
//!
//! Paths are absolute, `/`-separated and normalised: `.` segments vanish,
//! `..` climbs but never above the root, and trailing slashes are ignored.

use std::collections::BTreeMap;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use courier_protocol::{Entry, ErrorCode};
use courier_worker::WorkerFailure;
use thiserror::Error;

/// Owner recorded on nodes created without one.
pub const DEFAULT_OWNER: &str = "courier";
/// Space the tree reports as its capacity.
pub const CAPACITY: u64 = 64 * 1024 * 1024;

const DEFAULT_FILE_MODE: u32 = 0o644;
const DEFAULT_DIR_MODE: u32 = 0o755;
const MAX_LINK_HOPS: usize = 8;

/// Failures of tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Nothing exists at the path.
    #[error("{0} does not exist")]
    NotFound(Utf8PathBuf),
    /// A file is in the way.
    #[error("{0} already exists")]
    FileExists(Utf8PathBuf),
    /// A directory is in the way.
    #[error("directory {0} already exists")]
    DirectoryExists(Utf8PathBuf),
    /// A file operation targeted a directory.
    #[error("{0} is a directory")]
    IsDirectory(Utf8PathBuf),
    /// A directory operation targeted a file.
    #[error("{0} is not a directory")]
    NotDirectory(Utf8PathBuf),
    /// A directory still has children.
    #[error("directory {0} is not empty")]
    NotEmpty(Utf8PathBuf),
    /// The root cannot be moved or removed.
    #[error("the root directory cannot be changed this way")]
    Root,
    /// A directory cannot move below itself.
    #[error("cannot move {0} into itself")]
    IntoItself(Utf8PathBuf),
    /// Symbolic links nest too deeply or form a loop.
    #[error("too many levels of symbolic links at {0}")]
    LinkLoop(Utf8PathBuf),
    /// Writing would exceed the tree capacity.
    #[error("no space left for {0}")]
    Full(Utf8PathBuf),
}

impl TreeError {
    /// Maps the failure onto the shared error-code space.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::DOES_NOT_EXIST,
            Self::FileExists(_) => ErrorCode::FILE_ALREADY_EXIST,
            Self::DirectoryExists(_) => ErrorCode::DIR_ALREADY_EXIST,
            Self::IsDirectory(_) => ErrorCode::IS_DIRECTORY,
            Self::NotDirectory(_) => ErrorCode::IS_FILE,
            Self::NotEmpty(_) => ErrorCode::CANNOT_RMDIR,
            Self::Root => ErrorCode::ACCESS_DENIED,
            Self::IntoItself(_) => ErrorCode::CANNOT_RENAME,
            Self::LinkLoop(_) => ErrorCode::COULD_NOT_READ,
            Self::Full(_) => ErrorCode::DISK_FULL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content {
    File(Vec<u8>),
    Directory,
    Symlink(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    content: Content,
    permissions: u32,
    modified: i64,
    owner: String,
    group: String,
}

impl Node {
    fn new(content: Content, permissions: u32, now: i64) -> Self {
        Self {
            content,
            permissions,
            modified: now,
            owner: DEFAULT_OWNER.to_owned(),
            group: DEFAULT_OWNER.to_owned(),
        }
    }

    fn entry(&self, name: &str) -> Entry {
        let base = match &self.content {
            Content::File(bytes) => Entry::file(name, bytes.len() as u64),
            Content::Directory => Entry::directory(name),
            Content::Symlink(target) => Entry::symlink(name, target.as_str()),
        };
        base.with_permissions(self.permissions)
            .with_modified(self.modified)
            .with_owner(self.owner.as_str(), self.group.as_str())
    }
}

/// Normalises `raw` into an absolute path.
#[must_use]
pub fn normalise(raw: &str) -> Utf8PathBuf {
    let mut normalised = Utf8PathBuf::from("/");
    for component in Utf8Path::new(raw).components() {
        match component {
            Utf8Component::Normal(segment) => normalised.push(segment),
            Utf8Component::ParentDir => {
                normalised.pop();
            }
            Utf8Component::RootDir | Utf8Component::CurDir | Utf8Component::Prefix(_) => {}
        }
    }
    normalised
}

fn name_of(path: &Utf8Path) -> &str {
    path.file_name().unwrap_or("/")
}

// Relative targets resolve against the link's own directory.
fn resolve_link(link: &Utf8Path, target: &str) -> Utf8PathBuf {
    if target.starts_with('/') {
        return normalise(target);
    }
    let base = link.parent().unwrap_or(Utf8Path::new("/"));
    normalise(base.join(target).as_str())
}

/// A tree of files, directories and symbolic links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    nodes: BTreeMap<Utf8PathBuf, Node>,
    clock: i64,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates a tree holding only the root directory.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            Utf8PathBuf::from("/"),
            Node::new(Content::Directory, DEFAULT_DIR_MODE, 0),
        );
        Self { nodes, clock: 0 }
    }

    /// Advances the logical clock used for modification times.
    const fn tick(&mut self) -> i64 {
        self.clock = self.clock.saturating_add(1);
        self.clock
    }

    fn node(&self, path: &Utf8Path) -> Result<&Node, TreeError> {
        self.nodes
            .get(path)
            .ok_or_else(|| TreeError::NotFound(path.to_owned()))
    }

    fn node_mut(&mut self, path: &Utf8Path) -> Result<&mut Node, TreeError> {
        self.nodes
            .get_mut(path)
            .ok_or_else(|| TreeError::NotFound(path.to_owned()))
    }

    fn require_parent(&self, path: &Utf8Path) -> Result<(), TreeError> {
        let Some(parent) = path.parent() else {
            return Err(TreeError::Root);
        };
        match self.node(parent)?.content {
            Content::Directory => Ok(()),
            _ => Err(TreeError::NotDirectory(parent.to_owned())),
        }
    }

    fn children<'a>(
        &'a self,
        path: &'a Utf8Path,
    ) -> impl Iterator<Item = (&'a Utf8PathBuf, &'a Node)> {
        self.nodes
            .iter()
            .filter(move |(candidate, _)| candidate.parent() == Some(path))
    }

    fn used(&self) -> u64 {
        self.nodes
            .values()
            .map(|node| match &node.content {
                Content::File(bytes) => bytes.len() as u64,
                Content::Directory | Content::Symlink(_) => 0,
            })
            .sum()
    }

    /// Returns `true` when anything exists at `path`.
    #[must_use]
    pub fn exists(&self, path: &Utf8Path) -> bool {
        self.nodes.contains_key(path)
    }

    /// Describes the node at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`] when nothing exists there.
    pub fn stat(&self, path: &Utf8Path) -> Result<Entry, TreeError> {
        Ok(self.node(path)?.entry(name_of(path)))
    }

    /// Lists the direct children of the directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`] or [`TreeError::NotDirectory`].
    pub fn list(&self, path: &Utf8Path) -> Result<Vec<Entry>, TreeError> {
        match self.node(path)?.content {
            Content::Directory => Ok(self
                .children(path)
                .map(|(child, node)| node.entry(name_of(child)))
                .collect()),
            _ => Err(TreeError::NotDirectory(path.to_owned())),
        }
    }

    /// Returns the contents of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`] or [`TreeError::IsDirectory`].
    pub fn read(&self, path: &Utf8Path) -> Result<&[u8], TreeError> {
        let mut current = path.to_owned();
        for _ in 0..=MAX_LINK_HOPS {
            match &self.node(&current)?.content {
                Content::File(bytes) => return Ok(bytes.as_slice()),
                Content::Directory => return Err(TreeError::IsDirectory(current)),
                Content::Symlink(target) => current = resolve_link(&current, target),
            }
        }
        Err(TreeError::LinkLoop(path.to_owned()))
    }

    /// Stores `bytes` as the file at `path`, replacing any file there.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::IsDirectory`] when a directory is in the way,
    /// [`TreeError::Full`] when capacity would be exceeded, or a parent
    /// error when the parent directory is missing.
    pub fn write(
        &mut self,
        path: &Utf8Path,
        bytes: Vec<u8>,
        permissions: Option<u32>,
    ) -> Result<(), TreeError> {
        self.require_parent(path)?;
        let previous = match self.nodes.get(path).map(|node| &node.content) {
            Some(Content::Directory) => return Err(TreeError::IsDirectory(path.to_owned())),
            Some(Content::File(existing)) => existing.len() as u64,
            Some(Content::Symlink(_)) | None => 0,
        };
        let projected = self
            .used()
            .saturating_sub(previous)
            .saturating_add(bytes.len() as u64);
        if projected > CAPACITY {
            return Err(TreeError::Full(path.to_owned()));
        }
        let now = self.tick();
        let mode = permissions
            .or_else(|| self.nodes.get(path).map(|node| node.permissions))
            .unwrap_or(DEFAULT_FILE_MODE);
        self.nodes.insert(
            path.to_owned(),
            Node::new(Content::File(bytes), mode, now),
        );
        Ok(())
    }

    /// Creates a directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DirectoryExists`] or [`TreeError::FileExists`]
    /// when something is already there, or a parent error.
    pub fn mkdir(&mut self, path: &Utf8Path, permissions: Option<u32>) -> Result<(), TreeError> {
        if let Some(existing) = self.nodes.get(path) {
            return Err(match existing.content {
                Content::Directory => TreeError::DirectoryExists(path.to_owned()),
                _ => TreeError::FileExists(path.to_owned()),
            });
        }
        self.require_parent(path)?;
        let now = self.tick();
        self.nodes.insert(
            path.to_owned(),
            Node::new(
                Content::Directory,
                permissions.unwrap_or(DEFAULT_DIR_MODE),
                now,
            ),
        );
        Ok(())
    }

    /// Creates a symbolic link at `path` pointing at `target`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::FileExists`] when `path` is taken and
    /// `overwrite` is false, or a parent error.
    pub fn symlink(
        &mut self,
        target: &str,
        path: &Utf8Path,
        overwrite: bool,
    ) -> Result<(), TreeError> {
        self.require_parent(path)?;
        if self.exists(path) && !overwrite {
            return Err(TreeError::FileExists(path.to_owned()));
        }
        let now = self.tick();
        self.nodes.insert(
            path.to_owned(),
            Node::new(Content::Symlink(target.to_owned()), 0o777, now),
        );
        Ok(())
    }

    /// Points the existing link at `path` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`] when `path` is not a link.
    pub fn set_link_target(&mut self, path: &Utf8Path, target: &str) -> Result<(), TreeError> {
        let node = self.node_mut(path)?;
        match &mut node.content {
            Content::Symlink(existing) => {
                target.clone_into(existing);
                Ok(())
            }
            _ => Err(TreeError::NotFound(path.to_owned())),
        }
    }

    /// Moves the node at `source`, and everything below it, to `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::FileExists`] or [`TreeError::DirectoryExists`]
    /// when `dest` is taken and `overwrite` is false, and
    /// [`TreeError::DirectoryExists`] when `dest` is an ancestor of `source`.
    pub fn rename(
        &mut self,
        source: &Utf8Path,
        dest: &Utf8Path,
        overwrite: bool,
    ) -> Result<(), TreeError> {
        if source == Utf8Path::new("/") {
            return Err(TreeError::Root);
        }
        if dest == source {
            return Ok(());
        }
        if dest.starts_with(source) {
            return Err(TreeError::IntoItself(source.to_owned()));
        }
        self.node(source)?;
        if source.starts_with(dest) {
            return Err(TreeError::DirectoryExists(dest.to_owned()));
        }
        self.require_parent(dest)?;
        if let Some(existing) = self.nodes.get(dest) {
            if !overwrite {
                return Err(match existing.content {
                    Content::Directory => TreeError::DirectoryExists(dest.to_owned()),
                    _ => TreeError::FileExists(dest.to_owned()),
                });
            }
            self.remove_subtree(dest);
        }
        let moved: Vec<Utf8PathBuf> = self
            .nodes
            .keys()
            .filter(|candidate| candidate.starts_with(source))
            .cloned()
            .collect();
        for old in moved {
            let Ok(suffix) = old.strip_prefix(source) else {
                continue;
            };
            let new = if suffix.as_str().is_empty() {
                dest.to_owned()
            } else {
                dest.join(suffix)
            };
            if let Some(node) = self.nodes.remove(&old) {
                self.nodes.insert(new, node);
            }
        }
        Ok(())
    }

    fn remove_subtree(&mut self, path: &Utf8Path) {
        self.nodes.retain(|candidate, _| !candidate.starts_with(path));
    }

    /// Copies the file at `source` to `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::IsDirectory`] for directory sources and
    /// [`TreeError::FileExists`] when `dest` is taken without `overwrite`.
    pub fn copy(
        &mut self,
        source: &Utf8Path,
        dest: &Utf8Path,
        permissions: Option<u32>,
        overwrite: bool,
    ) -> Result<(), TreeError> {
        let bytes = self.read(source)?.to_vec();
        if self.exists(dest) && !overwrite {
            return Err(TreeError::FileExists(dest.to_owned()));
        }
        self.write(dest, bytes, permissions)
    }

    /// Removes a file or link (`is_file`) or an empty directory.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`], [`TreeError::IsDirectory`] /
    /// [`TreeError::NotDirectory`] on a kind mismatch, or
    /// [`TreeError::NotEmpty`] for a directory with children.
    pub fn delete(&mut self, path: &Utf8Path, is_file: bool) -> Result<(), TreeError> {
        if path == Utf8Path::new("/") {
            return Err(TreeError::Root);
        }
        let is_directory = matches!(self.node(path)?.content, Content::Directory);
        match (is_file, is_directory) {
            (true, true) => return Err(TreeError::IsDirectory(path.to_owned())),
            (false, false) => return Err(TreeError::NotDirectory(path.to_owned())),
            _ => {}
        }
        if is_directory && self.children(path).next().is_some() {
            return Err(TreeError::NotEmpty(path.to_owned()));
        }
        self.nodes.remove(path);
        Ok(())
    }

    /// Sets the permission bits of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`].
    pub fn chmod(&mut self, path: &Utf8Path, permissions: u32) -> Result<(), TreeError> {
        self.node_mut(path)?.permissions = permissions;
        Ok(())
    }

    /// Sets the owner and group of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`].
    pub fn chown(&mut self, path: &Utf8Path, owner: &str, group: &str) -> Result<(), TreeError> {
        let node = self.node_mut(path)?;
        owner.clone_into(&mut node.owner);
        group.clone_into(&mut node.group);
        Ok(())
    }

    /// Sets the modification time of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`].
    pub fn set_modified(&mut self, path: &Utf8Path, seconds: i64) -> Result<(), TreeError> {
        self.node_mut(path)?.modified = seconds;
        Ok(())
    }

    /// Sums the file sizes at and below `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`].
    pub fn usage(&self, path: &Utf8Path) -> Result<u64, TreeError> {
        self.node(path)?;
        Ok(self
            .nodes
            .iter()
            .filter(|(candidate, _)| candidate.starts_with(path))
            .map(|(_, node)| match &node.content {
                Content::File(bytes) => bytes.len() as u64,
                Content::Directory | Content::Symlink(_) => 0,
            })
            .sum())
    }

    /// Returns `(total, available)` bytes.
    #[must_use]
    pub fn space(&self) -> (u64, u64) {
        (CAPACITY, CAPACITY.saturating_sub(self.used()))
    }
}

impl From<TreeError> for WorkerFailure {
    fn from(error: TreeError) -> Self {
        Self::new(error.code(), error.to_string())
    }
}

#[cfg(test)]
mod tests;
