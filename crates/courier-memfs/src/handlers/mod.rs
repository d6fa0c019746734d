//! Operation handlers for the `memfs` scheme.
//!
//! Each handler receives the worker state, the session and the command that
//! was routed to it. Handlers destructure their own command variant; a
//! mismatched variant is an internal fault.

mod connection;
mod filesystem;
mod random_access;
mod transfer;

use camino::Utf8PathBuf;
use courier_protocol::{Command, Selector};
use courier_worker::{OperationTable, RegistrationError, WorkerFailure};
use url::Url;

use crate::MemFs;
use crate::tree::normalise;

pub use self::filesystem::{AVAILABLE_SPACE_KEY, TOTAL_SPACE_KEY, USAGE_KEY};
pub use self::random_access::OpenFile;
pub use self::transfer::CHUNK_SIZE;

/// Extension id reporting the bytes used at and below a path.
pub const USAGE_EXTENSION: u32 = 1;

/// Builds the table binding every selector `memfs` implements.
///
/// `mimetype` is left unbound so it falls back to `get`; `set-sub-url` is
/// left unsupported.
///
/// # Errors
///
/// Returns a [`RegistrationError`] if a selector is bound twice.
pub fn operation_table() -> Result<OperationTable<MemFs>, RegistrationError> {
    let mut table = OperationTable::new();
    table.register(Selector::Connect, connection::connect)?;
    table.register(Selector::CloseConnection, connection::close_connection)?;
    table.register(Selector::SetHost, connection::set_host)?;
    table.register(Selector::StatusQuery, connection::status_query)?;
    table.register(Selector::Special, connection::special)?;
    table.register(Selector::ReparseConfiguration, connection::reparse_configuration)?;
    table.register(Selector::Get, transfer::get)?;
    table.register(Selector::Put, transfer::put)?;
    table.register(Selector::MultiGet, transfer::multi_get)?;
    table.register(Selector::Open, random_access::open)?;
    table.register(Selector::Read, random_access::read)?;
    table.register(Selector::Write, random_access::write)?;
    table.register(Selector::Seek, random_access::seek)?;
    table.register(Selector::Truncate, random_access::truncate)?;
    table.register(Selector::Close, random_access::close)?;
    table.register(Selector::Stat, filesystem::stat)?;
    table.register(Selector::ListDir, filesystem::list_dir)?;
    table.register(Selector::Mkdir, filesystem::mkdir)?;
    table.register(Selector::Rename, filesystem::rename)?;
    table.register(Selector::Symlink, filesystem::symlink)?;
    table.register(Selector::SetLinkDest, filesystem::set_link_dest)?;
    table.register(Selector::Chmod, filesystem::chmod)?;
    table.register(Selector::Chown, filesystem::chown)?;
    table.register(Selector::SetModificationTime, filesystem::set_modification_time)?;
    table.register(Selector::Copy, filesystem::copy)?;
    table.register(Selector::Delete, filesystem::delete)?;
    table.register(Selector::FileSystemFreeSpace, filesystem::free_space)?;
    table.register_extension(USAGE_EXTENSION, filesystem::usage)?;
    Ok(table)
}

/// Maps a `memfs:` URL onto a tree path.
pub(crate) fn tree_path(url: &Url) -> Utf8PathBuf {
    normalise(url.path())
}

pub(crate) fn misrouted(command: &Command) -> WorkerFailure {
    WorkerFailure::internal(format!("handler received {}", command.selector()))
}
