//! A courier worker serving the `memfs` scheme from an in-memory tree.
//!
//! The tree starts empty apart from the root directory and lives as long as
//! the worker process. Every mutation goes through the same handlers the
//! controller reaches over the wire, which makes this worker the reference
//! implementation used by the integration tests of the dispatch engine.
//!
//! Behaviour can be tuned through incoming metadata:
//!
//! - [`REQUIRE_AUTH_KEY`] makes `connect` ask for credentials.
//! - [`KEEPALIVE_KEY`] arms an idle keepalive after `connect`.
//! - [`REQUIRE_PRIVILEGE_KEY`] routes `chown` through the privilege broker.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use courier_memfs::MemFs;
//! use courier_protocol::{Command, Notification};
//!
//! let worker = courier_memfs::spawn(MemFs::new()).unwrap();
//! worker.send(Command::Connect).unwrap();
//! let frames = worker.collect_operation(Duration::from_secs(1));
//! assert_eq!(frames, vec![Notification::Connected]);
//! worker.join().unwrap();
//! ```

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use courier_config::{Config, ConfigError};
use courier_worker::channel::StreamChannel;
use courier_worker::{Dispatcher, KillSwitch, RegistrationError, WorkerError, WorkerThread};
use thiserror::Error;
use tracing::info;

mod handlers;
pub mod mime;
pub mod tree;

pub use self::handlers::{CHUNK_SIZE, OpenFile, USAGE_EXTENSION, operation_table};
pub use self::handlers::{AVAILABLE_SPACE_KEY, TOTAL_SPACE_KEY, USAGE_KEY};
use self::tree::Tree;

/// Scheme served by this worker.
pub const PROTOCOL: &str = "memfs";
/// Incoming metadata key; `true` makes `connect` prompt for credentials.
pub const REQUIRE_AUTH_KEY: &str = "RequireAuth";
/// Incoming metadata key; the keepalive interval in milliseconds.
pub const KEEPALIVE_KEY: &str = "KeepaliveMs";
/// Incoming metadata key; `true` makes `chown` ask the privilege broker.
pub const REQUIRE_PRIVILEGE_KEY: &str = "RequirePrivilege";
/// Payload of the `special` command the keepalive timer dispatches.
pub const KEEPALIVE_PAYLOAD: &[u8] = b"keepalive";
/// Action id recorded once the broker has authorised `chown`.
pub const CHOWN_ACTION: &str = "org.courier.memfs.chown";

pub(crate) const MEMFS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::worker");
pub(crate) const HOSTLESS: &str = "localhost";

/// Host settings received through `set-host`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Host {
    pub(crate) name: String,
    pub(crate) port: u16,
    pub(crate) user: String,
    pub(crate) password: String,
}

/// State of one `memfs` worker.
#[derive(Debug, Default)]
pub struct MemFs {
    pub(crate) tree: Tree,
    pub(crate) host: Host,
    pub(crate) connected: bool,
    pub(crate) open: Option<OpenFile>,
    pub(crate) keepalives: u64,
}

impl MemFs {
    /// Creates a worker with an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a worker serving `tree`.
    #[must_use]
    pub fn with_tree(tree: Tree) -> Self {
        Self {
            tree,
            ..Self::default()
        }
    }

    /// Returns the tree.
    #[must_use]
    pub const fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Returns `true` after a successful `connect`.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Returns the file opened with `open`, if any.
    #[must_use]
    pub const fn open_file(&self) -> Option<&OpenFile> {
        self.open.as_ref()
    }

    /// Returns the host port set by `set-host`, zero for the default.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.host.port
    }

    /// Returns how many keepalives have been served.
    #[must_use]
    pub const fn keepalives(&self) -> u64 {
        self.keepalives
    }
}

/// Failures that stop the `courier-memfs` process.
#[derive(Debug, Error)]
pub enum RunError {
    /// Configuration could not be loaded, or help was requested.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The handler table could not be built.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    /// The worker could not start or its channel failed.
    #[error(transparent)]
    Worker(#[from] WorkerError),
}

impl RunError {
    /// Returns the process exit status for this error.
    #[must_use]
    pub const fn exit_status(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Registration(_) => 2,
            Self::Worker(error) => error.exit_status(),
        }
    }
}

/// Runs `worker` on a background thread over an in-memory channel.
///
/// # Errors
///
/// Returns [`RunError`] if the table cannot be built or the thread cannot
/// be started.
pub fn spawn(worker: MemFs) -> Result<WorkerThread, RunError> {
    let table = operation_table()?;
    Ok(WorkerThread::spawn(PROTOCOL, worker, table)?)
}

/// Entry point for the `courier-memfs` binary.
///
/// Loads configuration from `args` and the environment, installs logging
/// and serves the configured transport until the controller exits. Stdout
/// belongs to the protocol, so help, version and error text go to
/// `stderr`.
pub fn run<I, T, E>(args: I, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    E: Write,
{
    match serve(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(RunError::Config(error)) if error.is_informational() => {
            let _ = write!(stderr, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "courier-memfs: {error}");
            ExitCode::from(u8::try_from(error.exit_status()).unwrap_or(1))
        }
    }
}

fn serve<I, T>(args: I) -> Result<(), RunError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config = Config::load_from_iter(args)?.with_protocol(PROTOCOL);
    let _telemetry = courier_worker::telemetry::initialise(&config).map_err(WorkerError::from)?;
    let channel = StreamChannel::connect(config.transport())
        .map_err(|error| WorkerError::connect(config.transport(), error))?;
    let kill = KillSwitch::new();
    kill.register_termination_signals()
        .map_err(WorkerError::signals)?;
    info!(
        target: MEMFS_TARGET,
        transport = %config.transport(),
        "serving memfs"
    );
    let mut dispatcher =
        Dispatcher::new(PROTOCOL, MemFs::new(), operation_table()?, channel).with_kill_switch(kill);
    dispatcher.run()?;
    Ok(())
}

#[cfg(test)]
mod tests;
