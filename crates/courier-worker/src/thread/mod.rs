//! Running a worker on a background thread inside the controller process.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use courier_protocol::{Command, Notification};
use tracing::debug;

use crate::channel::{ChannelError, ControllerHandle, MemoryChannel};
use crate::dispatch::{DISPATCH_TARGET, Dispatcher};
use crate::error::WorkerError;
use crate::kill::KillSwitch;
use crate::table::OperationTable;

/// A dispatcher running on its own thread over an in-memory channel.
///
/// Dropping the handle closes the command direction, which ends the worker
/// loop once queued commands are served; it does not wait for the thread.
#[derive(Debug)]
pub struct WorkerThread {
    controller: ControllerHandle,
    kill: KillSwitch,
    handle: Option<JoinHandle<Result<(), WorkerError>>>,
}

impl WorkerThread {
    /// Spawns a worker serving `protocol` with the given handlers.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Spawn`] if the thread cannot be started.
    pub fn spawn<W>(
        protocol: impl Into<String>,
        worker: W,
        table: OperationTable<W>,
    ) -> Result<Self, WorkerError>
    where
        W: Send + 'static,
    {
        let protocol_name = protocol.into();
        let (channel, controller) = MemoryChannel::pair();
        let kill = KillSwitch::new();
        let mut dispatcher = Dispatcher::new(protocol_name.clone(), worker, table, channel)
            .with_kill_switch(kill.clone());
        let handle = thread::Builder::new()
            .name(format!("courier-{protocol_name}"))
            .spawn(move || dispatcher.run())
            .map_err(WorkerError::spawn)?;
        debug!(target: DISPATCH_TARGET, protocol = %protocol_name, "worker thread spawned");
        Ok(Self {
            controller,
            kill,
            handle: Some(handle),
        })
    }

    /// Sends a command to the worker.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::ConnectionLost`] once the worker has stopped
    /// or the handle was aborted.
    pub fn send(&self, command: Command) -> Result<(), ChannelError> {
        self.controller.send(command)
    }

    /// Waits up to `timeout` for the next notification.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Notification> {
        self.controller.recv_timeout(timeout)
    }

    /// Collects notifications until a closing frame or the deadline.
    #[must_use]
    pub fn collect_operation(&self, timeout: Duration) -> Vec<Notification> {
        self.controller.collect_operation(timeout)
    }

    /// Returns every notification already queued.
    #[must_use]
    pub fn drain(&self) -> Vec<Notification> {
        self.controller.drain()
    }

    /// Returns the switch shared with the worker's session.
    #[must_use]
    pub fn kill_switch(&self) -> KillSwitch {
        self.kill.clone()
    }

    /// Asks the worker to stop: trips its kill switch and closes the
    /// command direction.
    pub fn abort(&mut self) {
        self.kill.kill();
        self.controller.close();
    }

    /// Closes the command direction and waits for the worker to finish.
    ///
    /// # Errors
    ///
    /// Returns the worker loop's own error, or
    /// [`WorkerError::ThreadPanicked`] if a handler panicked.
    pub fn join(mut self) -> Result<(), WorkerError> {
        self.controller.close();
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        handle.join().map_err(|_| WorkerError::ThreadPanicked)?
    }
}
