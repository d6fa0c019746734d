//! Framed channel over a byte stream.
//!
//! A dedicated reader thread decodes inbound frames into a queue so
//! [`Channel::receive`] can honour a timeout even though the underlying
//! stream only offers blocking reads. Outbound frames are written directly
//! by the caller.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use courier_config::TransportEndpoint;
use courier_protocol::{Command, FrameReader, FrameWriter, Notification};
use tracing::{debug, warn};

use super::{CHANNEL_TARGET, Channel, ChannelError, receive_from};

#[cfg(unix)]
use std::os::unix::net::UnixStream;

type Inbound = Result<Command, ChannelError>;

/// [`Channel`] speaking the `Content-Length` wire format over a byte stream.
pub struct StreamChannel {
    inbound: Receiver<Inbound>,
    writer: FrameWriter<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for StreamChannel {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("StreamChannel")
            .finish_non_exhaustive()
    }
}

impl StreamChannel {
    /// Builds a channel from separate read and write halves.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Io`] if the reader thread cannot be spawned.
    pub fn new<R, W>(reader: R, writer: W) -> Result<Self, ChannelError>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let (sender, inbound) = mpsc::channel();
        thread::Builder::new()
            .name("courier-channel-reader".to_owned())
            .spawn(move || read_loop(BufReader::new(reader), &sender))
            .map_err(ChannelError::io)?;
        let boxed: Box<dyn Write + Send> = Box::new(writer);
        Ok(Self {
            inbound,
            writer: FrameWriter::new(boxed),
        })
    }

    /// Runs the channel over the process's standard input and output.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Io`] if the reader thread cannot be spawned.
    pub fn stdio() -> Result<Self, ChannelError> {
        Self::new(io::stdin(), io::stdout())
    }

    /// Connects to the controller at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Io`] if the connection fails or the platform
    /// lacks the requested socket family.
    pub fn connect(endpoint: &TransportEndpoint) -> Result<Self, ChannelError> {
        match endpoint {
            TransportEndpoint::Stdio => Self::stdio(),
            TransportEndpoint::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port)).map_err(ChannelError::io)?;
                let reader = stream.try_clone().map_err(ChannelError::io)?;
                Self::new(reader, stream)
            }
            TransportEndpoint::Unix { path } => Self::connect_unix(path.as_std_path()),
        }
    }

    #[cfg(unix)]
    fn connect_unix(path: &std::path::Path) -> Result<Self, ChannelError> {
        let stream = UnixStream::connect(path).map_err(ChannelError::io)?;
        let reader = stream.try_clone().map_err(ChannelError::io)?;
        Self::new(reader, stream)
    }

    #[cfg(not(unix))]
    fn connect_unix(path: &std::path::Path) -> Result<Self, ChannelError> {
        Err(ChannelError::io(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("unix sockets are unavailable: {}", path.display()),
        )))
    }
}

impl Channel for StreamChannel {
    fn send(&mut self, notification: &Notification) -> Result<(), ChannelError> {
        self.writer
            .write_message(notification)
            .map_err(ChannelError::from)
    }

    fn receive(&mut self, timeout: Option<Duration>) -> Result<Option<Command>, ChannelError> {
        match receive_from(&self.inbound, timeout)? {
            Some(inbound) => inbound.map(Some),
            None => Ok(None),
        }
    }
}

fn read_loop<R: BufRead>(reader: R, sender: &Sender<Inbound>) {
    let mut frames = FrameReader::new(reader);
    loop {
        let (inbound, keep_reading) = match frames.read_message::<Command>() {
            Ok(Some(command)) => (Ok(command), true),
            Ok(None) => {
                debug!(target: CHANNEL_TARGET, "controller closed the channel");
                return;
            }
            Err(error) => {
                let recoverable = error.is_recoverable();
                warn!(
                    target: CHANNEL_TARGET,
                    error = %error,
                    recoverable,
                    "failed to read frame"
                );
                (Err(ChannelError::from(error)), recoverable)
            }
        };
        if sender.send(inbound).is_err() || !keep_reading {
            return;
        }
    }
}
