//! Cooperative cancellation flag.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use tracing::info;

const KILL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::kill");

/// Shared flag asking the worker to stop.
///
/// The dispatcher checks it between commands and while awaiting answers.
/// Handlers poll it through [`Session::was_killed`](crate::Session::was_killed).
#[derive(Debug, Clone, Default)]
pub struct KillSwitch {
    flag: Arc<AtomicBool>,
}

impl KillSwitch {
    /// Creates an untripped switch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trips the switch. Idempotent.
    pub fn kill(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            info!(target: KILL_TARGET, "kill requested");
        }
    }

    /// Returns `true` once the switch has tripped.
    #[must_use]
    pub fn is_killed(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Trips the switch when the process receives `SIGTERM` or `SIGINT`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a handler cannot be installed.
    pub fn register_termination_signals(&self) -> io::Result<()> {
        for signal in [SIGTERM, SIGINT] {
            signal_hook::flag::register(signal, Arc::clone(&self.flag))?;
        }
        Ok(())
    }
}
