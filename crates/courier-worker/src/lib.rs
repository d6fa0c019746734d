//! Dispatch engine for courier protocol workers.
//!
//! A worker serves one URL scheme for a controller process. The controller
//! sends [`Command`](courier_protocol::Command) frames over a [`Channel`];
//! the [`Dispatcher`] runs them one at a time through an explicit
//! [`OperationTable`] and answers with
//! [`Notification`](courier_protocol::Notification) frames. Each operation
//! produces at most one `finished` or `error`, chosen from the handler's
//! [`WorkerResult`] and the selector's [`Finalization`] class.
//!
//! Handlers get a mutable [`Session`] through which they report progress,
//! stream data, read and write metadata, arm the idle timer and ask the
//! controller questions (credentials, message boxes, host lookups) without
//! returning to the dispatch loop.
//!
//! ```
//! use std::time::Duration;
//!
//! use courier_protocol::{Command, Notification, Selector};
//! use courier_worker::{OperationTable, WorkerThread};
//!
//! let mut table = OperationTable::<u32>::new();
//! table
//!     .register(Selector::Connect, |connections, _, _| {
//!         *connections += 1;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let worker = WorkerThread::spawn("demo", 0, table).unwrap();
//! worker.send(Command::Connect).unwrap();
//! let frames = worker.collect_operation(Duration::from_secs(1));
//! assert_eq!(frames, vec![Notification::Connected]);
//! worker.send(Command::Exit).unwrap();
//! worker.join().unwrap();
//! ```

pub mod channel;
mod collaborators;
mod dispatch;
mod error;
mod kill;
mod result;
mod session;
mod table;
pub mod telemetry;
mod thread;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use self::channel::{Channel, ChannelError, ControllerHandle, MemoryChannel, StreamChannel};
pub use self::collaborators::{AuthStore, MemoryAuthStore, NullAuthStore};
pub use self::dispatch::Dispatcher;
pub use self::error::{AnswerError, WorkerError};
pub use self::kill::KillSwitch;
pub use self::result::{WorkerFailure, WorkerResult};
pub use self::session::{
    Answer, CONNECT_TIMEOUT_KEY, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PROXY_CONNECT_TIMEOUT,
    DEFAULT_READ_TIMEOUT, DEFAULT_RESPONSE_TIMEOUT, Direction, MetadataStore,
    PROXY_CONNECT_TIMEOUT_KEY, PendingAnswer, READ_TIMEOUT_KEY, RESPONSE_TIMEOUT_KEY, Session,
    SessionState,
};
pub use self::table::{Finalization, Handler, OperationTable, RegistrationError};
pub use self::telemetry::{TelemetryError, TelemetryHandle};
pub use self::thread::WorkerThread;

#[cfg(test)]
mod tests;
