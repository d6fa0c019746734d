//! In-process channel backed by standard library queues.

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use courier_protocol::{Command, Notification};

use super::{Channel, ChannelError, receive_from};

/// Worker end of an in-process channel.
#[derive(Debug)]
pub struct MemoryChannel {
    inbound: Receiver<Command>,
    outbound: Sender<Notification>,
}

impl MemoryChannel {
    /// Creates a connected worker end and controller end.
    ///
    /// # Example
    ///
    /// ```
    /// use courier_protocol::{Command, Notification};
    /// use courier_worker::channel::{Channel, MemoryChannel};
    ///
    /// let (mut worker_end, controller) = MemoryChannel::pair();
    /// controller.send(Command::Connect).unwrap();
    /// assert_eq!(worker_end.receive(None).unwrap(), Some(Command::Connect));
    ///
    /// worker_end.send(&Notification::Connected).unwrap();
    /// assert_eq!(controller.drain(), vec![Notification::Connected]);
    /// ```
    #[must_use]
    pub fn pair() -> (Self, ControllerHandle) {
        let (command_tx, command_rx) = mpsc::channel();
        let (notification_tx, notification_rx) = mpsc::channel();
        let worker_end = Self {
            inbound: command_rx,
            outbound: notification_tx,
        };
        let controller = ControllerHandle {
            commands: Some(command_tx),
            notifications: notification_rx,
        };
        (worker_end, controller)
    }
}

impl Channel for MemoryChannel {
    fn send(&mut self, notification: &Notification) -> Result<(), ChannelError> {
        self.outbound
            .send(notification.clone())
            .map_err(|_| ChannelError::ConnectionLost)
    }

    fn receive(&mut self, timeout: Option<Duration>) -> Result<Option<Command>, ChannelError> {
        receive_from(&self.inbound, timeout)
    }
}

/// Controller end of an in-process channel.
#[derive(Debug)]
pub struct ControllerHandle {
    commands: Option<Sender<Command>>,
    notifications: Receiver<Notification>,
}

impl ControllerHandle {
    /// Queues a command for the worker.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::ConnectionLost`] once this end was closed or
    /// the worker end was dropped.
    pub fn send(&self, command: Command) -> Result<(), ChannelError> {
        let sender = self
            .commands
            .as_ref()
            .ok_or(ChannelError::ConnectionLost)?;
        sender
            .send(command)
            .map_err(|_| ChannelError::ConnectionLost)
    }

    /// Waits up to `timeout` for the next notification.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Notification> {
        self.notifications.recv_timeout(timeout).ok()
    }

    /// Returns every notification already queued, without waiting.
    #[must_use]
    pub fn drain(&self) -> Vec<Notification> {
        self.notifications.try_iter().collect()
    }

    /// Collects notifications until one closes out an operation or the
    /// deadline passes.
    ///
    /// The closing frame is included as the last element when it arrived.
    #[must_use]
    pub fn collect_operation(&self, timeout: Duration) -> Vec<Notification> {
        let deadline = Instant::now() + timeout;
        let mut collected = Vec::new();
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            let Some(notification) = self.recv_timeout(remaining) else {
                break;
            };
            let terminal = notification.is_terminal();
            collected.push(notification);
            if terminal {
                break;
            }
        }
        collected
    }

    /// Closes the command direction; the worker observes
    /// [`ChannelError::ConnectionLost`] once queued commands are consumed.
    pub fn close(&mut self) {
        self.commands = None;
    }

    /// Returns `true` while commands can still be sent.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.commands.is_some()
    }
}
