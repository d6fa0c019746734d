//! Explicit selector-to-handler table.
//!
//! A worker declares the operations it implements by registering one
//! handler per selector. Anything left unregistered falls back to a default
//! route: `mimetype` borrows the `get` handler, `status-query` pushes an
//! idle status, connection housekeeping is a no-op, and everything else
//! fails with `UNSUPPORTED_ACTION` without invoking any handler. The set of
//! supported selectors is therefore known before the first command arrives.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use courier_protocol::{Command, Selector};
use thiserror::Error;

use crate::result::WorkerResult;
use crate::session::Session;

/// Boxed operation handler for a worker of type `W`.
pub type Handler<W> = Box<dyn Fn(&mut W, &mut Session, &Command) -> WorkerResult + Send + Sync>;

/// How the dispatcher reports a handler's result to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finalization {
    /// Exactly one of `finished` or `error`.
    Report,
    /// `error` on failure, nothing on success.
    ErrorOnly,
    /// `connected` on success, `error` on failure.
    Connect,
    /// Nothing either way.
    Silent,
    /// Nothing either way; the handler pushes a `status` frame itself.
    Status,
}

impl Finalization {
    /// Returns the finalization class of an operation selector, or `None`
    /// for answer and control selectors, which are never dispatched.
    #[must_use]
    pub const fn for_selector(selector: Selector) -> Option<Self> {
        let class = match selector {
            Selector::Get
            | Selector::Put
            | Selector::Open
            | Selector::Close
            | Selector::Stat
            | Selector::Mimetype
            | Selector::ListDir
            | Selector::Mkdir
            | Selector::Rename
            | Selector::Symlink
            | Selector::Chmod
            | Selector::Chown
            | Selector::SetModificationTime
            | Selector::Copy
            | Selector::Delete
            | Selector::SetSubUrl
            | Selector::SetLinkDest
            | Selector::MultiGet
            | Selector::FileSystemFreeSpace => Self::Report,
            Selector::Read
            | Selector::Write
            | Selector::Seek
            | Selector::Truncate
            | Selector::Special
            | Selector::Extension => Self::ErrorOnly,
            Selector::Connect => Self::Connect,
            Selector::CloseConnection | Selector::SetHost | Selector::ReparseConfiguration => {
                Self::Silent
            }
            Selector::StatusQuery => Self::Status,
            Selector::Metadata
            | Selector::Exit
            | Selector::Data
            | Selector::MessageBoxAnswer
            | Selector::CredentialAnswer
            | Selector::HostInfo
            | Selector::ResumeAnswer
            | Selector::PrivilegeAnswer => return None,
        };
        Some(class)
    }
}

/// Where a command goes once the table has looked at it.
pub(crate) enum Route<'a, W> {
    /// A registered handler.
    Handler(&'a Handler<W>),
    /// Push an idle status frame.
    DefaultStatus,
    /// Accept and do nothing.
    Ignore,
    /// Fail with `UNSUPPORTED_ACTION`.
    Unsupported,
}

/// Errors raised while building an [`OperationTable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A handler is already bound to the selector.
    #[error("a handler for {selector} is already registered")]
    Duplicate {
        /// Selector registered twice.
        selector: Selector,
    },

    /// A handler is already bound to the extension id.
    #[error("a handler for extension {id} is already registered")]
    DuplicateExtension {
        /// Extension id registered twice.
        id: u32,
    },

    /// The selector is an answer or control frame and never dispatched, or
    /// is `extension`, which registers through
    /// [`OperationTable::register_extension`].
    #[error("{selector} cannot be bound to a handler")]
    NotDispatchable {
        /// Offending selector.
        selector: Selector,
    },
}

/// Maps selectors to the handlers of a worker of type `W`.
///
/// # Example
///
/// ```
/// use courier_protocol::{Command, Selector};
/// use courier_worker::{OperationTable, WorkerFailure};
///
/// struct Echo;
///
/// let mut table = OperationTable::<Echo>::new();
/// table
///     .register(Selector::Stat, |_worker, _session, command| match command {
///         Command::Stat { url } => Err(WorkerFailure::does_not_exist(url.as_str())),
///         _ => Ok(()),
///     })
///     .unwrap();
///
/// assert!(table.supports(Selector::Stat));
/// assert!(!table.supports(Selector::Get));
/// assert!(table.register(Selector::Stat, |_, _, _| Ok(())).is_err());
/// ```
pub struct OperationTable<W> {
    handlers: BTreeMap<Selector, Handler<W>>,
    extensions: BTreeMap<u32, Handler<W>>,
}

impl<W> Default for OperationTable<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> fmt::Debug for OperationTable<W> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("OperationTable")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("extensions", &self.extensions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<W> OperationTable<W> {
    /// Creates an empty table; every operation starts out unsupported.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
            extensions: BTreeMap::new(),
        }
    }

    /// Binds `handler` to `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Duplicate`] if the selector is already
    /// bound, or [`RegistrationError::NotDispatchable`] for answer, control
    /// and extension selectors.
    pub fn register<F>(&mut self, selector: Selector, handler: F) -> Result<(), RegistrationError>
    where
        F: Fn(&mut W, &mut Session, &Command) -> WorkerResult + Send + Sync + 'static,
    {
        if Finalization::for_selector(selector).is_none() || selector == Selector::Extension {
            return Err(RegistrationError::NotDispatchable { selector });
        }
        if self.handlers.contains_key(&selector) {
            return Err(RegistrationError::Duplicate { selector });
        }
        self.handlers.insert(selector, Box::new(handler));
        Ok(())
    }

    /// Binds `handler` to the reserved extension `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::DuplicateExtension`] if the id is
    /// already bound.
    pub fn register_extension<F>(&mut self, id: u32, handler: F) -> Result<(), RegistrationError>
    where
        F: Fn(&mut W, &mut Session, &Command) -> WorkerResult + Send + Sync + 'static,
    {
        if self.extensions.contains_key(&id) {
            return Err(RegistrationError::DuplicateExtension { id });
        }
        self.extensions.insert(id, Box::new(handler));
        Ok(())
    }

    /// Returns `true` when the worker explicitly handles `selector`.
    #[must_use]
    pub fn is_bound(&self, selector: Selector) -> bool {
        self.handlers.contains_key(&selector)
    }

    /// Returns `true` when dispatching `selector` reaches real behaviour
    /// rather than the `UNSUPPORTED_ACTION` default.
    #[must_use]
    pub fn supports(&self, selector: Selector) -> bool {
        if self.is_bound(selector) {
            return true;
        }
        match selector {
            Selector::Mimetype => self.is_bound(Selector::Get),
            Selector::Extension => !self.extensions.is_empty(),
            other => matches!(
                Finalization::for_selector(other),
                Some(Finalization::Silent | Finalization::Status)
            ),
        }
    }

    /// Lists every operation selector this table supports.
    #[must_use]
    pub fn supported(&self) -> BTreeSet<Selector> {
        use strum::IntoEnumIterator;

        Selector::iter()
            .filter(|selector| selector.is_operation() && self.supports(*selector))
            .collect()
    }

    /// Returns the registered extension ids.
    #[must_use]
    pub fn extension_ids(&self) -> BTreeSet<u32> {
        self.extensions.keys().copied().collect()
    }

    /// Rewrites commands that default to another selector's handler.
    ///
    /// An unbound `mimetype` becomes a `get` of the same URL when `get` is
    /// bound, so the worker streams the resource and the controller sniffs
    /// its type from the `mime_type` frame and the data.
    pub(crate) fn redirect(&self, command: Command) -> Command {
        if let Command::Mimetype { url } = command {
            if !self.is_bound(Selector::Mimetype) && self.is_bound(Selector::Get) {
                return Command::Get { url };
            }
            return Command::Mimetype { url };
        }
        command
    }

    pub(crate) fn route(&self, command: &Command) -> Route<'_, W> {
        if let Command::Extension { id, .. } = command {
            return self
                .extensions
                .get(id)
                .map_or(Route::Unsupported, Route::Handler);
        }
        let selector = command.selector();
        if let Some(handler) = self.handlers.get(&selector) {
            return Route::Handler(handler);
        }
        match Finalization::for_selector(selector) {
            Some(Finalization::Status) => Route::DefaultStatus,
            Some(Finalization::Silent) => Route::Ignore,
            _ => Route::Unsupported,
        }
    }
}
