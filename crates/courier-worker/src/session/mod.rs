//! Per-worker session shared by every handler invocation.
//!
//! The [`Session`] owns the channel, both metadata sets, the idle timer, the
//! kill switch and the collaborator hooks. Handlers receive it mutably, which
//! is what lets them push progress frames, ask the controller questions and
//! stream data while the dispatcher is blocked on them. Only one handler runs
//! at a time and a nested wait borrows the session mutably, so at most one
//! answer is ever outstanding.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use courier_protocol::{AuthInfo, Command, Entry, Notification, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::channel::{Channel, ChannelError};
use crate::collaborators::{AuthStore, NullAuthStore};
use crate::kill::KillSwitch;

mod answer;
mod listing;
mod metadata;
mod streaming;
mod timer;

pub use self::answer::{Answer, PendingAnswer};
pub use self::metadata::{
    CONNECT_TIMEOUT_KEY, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PROXY_CONNECT_TIMEOUT,
    DEFAULT_READ_TIMEOUT, DEFAULT_RESPONSE_TIMEOUT, MetadataStore, PROXY_CONNECT_TIMEOUT_KEY,
    READ_TIMEOUT_KEY, RESPONSE_TIMEOUT_KEY,
};
pub use self::streaming::Direction;

use self::listing::ListingBuffer;
use self::streaming::StreamTracker;
use self::timer::IdleTimer;

pub(crate) const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the next command.
    Idle,
    /// A handler for this selector is running.
    Dispatching(Selector),
    /// A handler is blocked on a reply from the controller.
    AwaitingAnswer(PendingAnswer),
    /// A handler is moving payload bytes.
    Streaming {
        /// Which way the bytes flow.
        direction: Direction,
        /// Bytes moved so far in this operation.
        bytes: u64,
    },
    /// No further commands are accepted.
    Terminating,
}

/// Mutable state shared by the dispatcher and the running handler.
pub struct Session {
    protocol: String,
    channel: Box<dyn Channel>,
    state: SessionState,
    incoming: MetadataStore,
    outgoing: MetadataStore,
    timer: IdleTimer,
    kill: KillSwitch,
    stream: StreamTracker,
    listing: ListingBuffer,
    auth: Box<dyn AuthStore>,
    temporary_authorizations: BTreeSet<String>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Session")
            .field("protocol", &self.protocol)
            .field("state", &self.state)
            .field("incoming", &self.incoming)
            .field("outgoing", &self.outgoing)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(protocol: String, channel: Box<dyn Channel>) -> Self {
        Self {
            protocol,
            channel,
            state: SessionState::Idle,
            incoming: MetadataStore::new(),
            outgoing: MetadataStore::new(),
            timer: IdleTimer::default(),
            kill: KillSwitch::new(),
            stream: StreamTracker::default(),
            listing: ListingBuffer::new(Instant::now()),
            auth: Box::new(NullAuthStore),
            temporary_authorizations: BTreeSet::new(),
        }
    }

    /// Returns the scheme this worker serves.
    #[must_use]
    pub const fn protocol(&self) -> &str {
        self.protocol.as_str()
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns `true` once no further commands are accepted.
    #[must_use]
    pub const fn is_terminating(&self) -> bool {
        matches!(self.state, SessionState::Terminating)
    }

    // -----------------------------------------------------------------------
    // Progress notifications
    // -----------------------------------------------------------------------

    /// Reports the total size of the transfer.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn total_size(&mut self, size: u64) -> Result<(), ChannelError> {
        self.send(&Notification::TotalSize { size })
    }

    /// Reports bytes processed so far.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn processed_size(&mut self, size: u64) -> Result<(), ChannelError> {
        self.send(&Notification::ProcessedSize { size })
    }

    /// Reports the cursor of the open resource.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn position(&mut self, offset: u64) -> Result<(), ChannelError> {
        self.send(&Notification::Position { offset })
    }

    /// Reports bytes written to the open resource.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn written(&mut self, bytes: u64) -> Result<(), ChannelError> {
        self.send(&Notification::Written { bytes })
    }

    /// Reports the new length of a truncated resource.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn truncated(&mut self, length: u64) -> Result<(), ChannelError> {
        self.send(&Notification::Truncated { length })
    }

    /// Reports the current transfer speed.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn speed(&mut self, bytes_per_second: u64) -> Result<(), ChannelError> {
        self.send(&Notification::Speed { bytes_per_second })
    }

    /// Reports that the resource moved to `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn redirection(&mut self, url: Url) -> Result<(), ChannelError> {
        self.send(&Notification::Redirection { url })
    }

    /// Reports the MIME type of the resource being fetched.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn mime_type(&mut self, mime_type: impl Into<String>) -> Result<(), ChannelError> {
        self.send(&Notification::MimeType {
            mime_type: mime_type.into(),
        })
    }

    /// Sends a non-fatal warning.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn warning(&mut self, message: impl Into<String>) -> Result<(), ChannelError> {
        self.send(&Notification::Warning {
            message: message.into(),
        })
    }

    /// Sends an informational status line.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn info_message(&mut self, message: impl Into<String>) -> Result<(), ChannelError> {
        self.send(&Notification::InfoMessage {
            message: message.into(),
        })
    }

    /// Sends the result of `stat`.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn stat_entry(&mut self, entry: Entry) -> Result<(), ChannelError> {
        self.send(&Notification::StatEntry { entry })
    }

    /// Marks the data that follows as an error page.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn error_page(&mut self) -> Result<(), ChannelError> {
        self.send(&Notification::ErrorPage)
    }

    /// Asks the controller to supply data from the nested URL.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn need_sub_url_data(&mut self) -> Result<(), ChannelError> {
        self.send(&Notification::NeedSubUrlData)
    }

    /// Pushes the reply to `status-query`.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn status(&mut self, host: impl Into<String>, connected: bool) -> Result<(), ChannelError> {
        self.send(&Notification::Status {
            host: host.into(),
            connected,
        })
    }

    // -----------------------------------------------------------------------
    // Directory listing
    // -----------------------------------------------------------------------

    /// Adds one entry to the current listing.
    ///
    /// Entries are sent in batches; whatever is still buffered goes out
    /// before `finished` and is dropped if the operation fails.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if a due batch cannot be sent.
    pub fn list_entry(&mut self, entry: Entry) -> Result<(), ChannelError> {
        self.listing
            .push(entry, Instant::now())
            .map_or(Ok(()), |entries| {
                self.send(&Notification::ListEntries { entries })
            })
    }

    /// Sends `entries` immediately, after anything already buffered.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if a frame cannot be sent.
    pub fn list_entries(&mut self, entries: Vec<Entry>) -> Result<(), ChannelError> {
        self.flush_listing()?;
        if entries.is_empty() {
            return Ok(());
        }
        self.send(&Notification::ListEntries { entries })
    }

    // -----------------------------------------------------------------------
    // Metadata
    // -----------------------------------------------------------------------

    /// Returns the metadata supplied by the controller.
    #[must_use]
    pub const fn incoming_metadata(&self) -> &MetadataStore {
        &self.incoming
    }

    /// Returns `true` when the controller supplied `key`.
    #[must_use]
    pub fn has_metadata(&self, key: &str) -> bool {
        self.incoming.contains(key)
    }

    /// Returns the incoming value for `key`.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.incoming.get(key)
    }

    /// Returns the incoming value for `key`, or `default`.
    #[must_use]
    pub fn metadata_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.incoming.get_or(key, default)
    }

    /// Reads an incoming boolean setting.
    #[must_use]
    pub fn config_bool(&self, key: &str, default: bool) -> bool {
        self.incoming.bool_or(key, default)
    }

    /// Reads an incoming integer setting.
    #[must_use]
    pub fn config_int(&self, key: &str, default: i64) -> i64 {
        self.incoming.int_or(key, default)
    }

    /// Reads an incoming string setting.
    #[must_use]
    pub fn config_str(&self, key: &str, default: &str) -> String {
        self.incoming.get_or(key, default).to_owned()
    }

    /// Connect timeout from `ConnectTimeout`, default 20 s.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.incoming
            .timeout_or(CONNECT_TIMEOUT_KEY, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Proxy connect timeout from `ProxyConnectTimeout`, default 10 s.
    #[must_use]
    pub fn proxy_connect_timeout(&self) -> Duration {
        self.incoming
            .timeout_or(PROXY_CONNECT_TIMEOUT_KEY, DEFAULT_PROXY_CONNECT_TIMEOUT)
    }

    /// Response timeout from `ResponseTimeout`, default 600 s.
    #[must_use]
    pub fn response_timeout(&self) -> Duration {
        self.incoming
            .timeout_or(RESPONSE_TIMEOUT_KEY, DEFAULT_RESPONSE_TIMEOUT)
    }

    /// Read timeout from `ReadTimeout`, default 15 s.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.incoming.timeout_or(READ_TIMEOUT_KEY, DEFAULT_READ_TIMEOUT)
    }

    /// Returns metadata waiting to be sent to the controller.
    #[must_use]
    pub const fn outgoing_metadata(&self) -> &MetadataStore {
        &self.outgoing
    }

    /// Queues an outgoing key; it travels with the next flush.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.outgoing.insert(key, value);
    }

    /// Sends pending outgoing metadata.
    ///
    /// With `keep` false the outgoing set is emptied; with `keep` true it
    /// is left as it was. Nothing is sent while the set is empty.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn flush_metadata(&mut self, keep: bool) -> Result<(), ChannelError> {
        if self.outgoing.is_empty() {
            return Ok(());
        }
        let entries = if keep {
            self.outgoing.snapshot()
        } else {
            self.outgoing.take()
        };
        self.send(&Notification::MetaData { entries })
    }

    /// Sends and clears pending outgoing metadata.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn send_metadata(&mut self) -> Result<(), ChannelError> {
        self.flush_metadata(false)
    }

    /// Sends pending outgoing metadata and keeps it for the next flush.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the frame cannot be sent.
    pub fn send_and_keep_metadata(&mut self) -> Result<(), ChannelError> {
        self.flush_metadata(true)
    }

    // -----------------------------------------------------------------------
    // Idle timer and cancellation
    // -----------------------------------------------------------------------

    /// Arms the idle timer.
    ///
    /// If no operation is dispatched before `timeout` elapses, the engine
    /// dispatches `special(payload)` as though the controller had sent it.
    /// Arming replaces any earlier timer and `None` disarms it. The timer
    /// only fires while the worker is idle.
    pub fn set_timeout_special_command(
        &mut self,
        timeout: Option<Duration>,
        payload: impl Into<Vec<u8>>,
    ) {
        let Some(after) = timeout else {
            self.timer.cancel();
            return;
        };
        debug!(
            target: SESSION_TARGET,
            after_ms = after.as_millis(),
            "idle timer armed"
        );
        self.timer.arm(after, payload.into(), Instant::now());
    }

    /// Returns `true` while an idle timer is armed.
    #[must_use]
    pub const fn idle_timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    /// Returns `true` once the worker has been asked to stop.
    ///
    /// Long-running handlers poll this and return early with a failure.
    #[must_use]
    pub fn was_killed(&self) -> bool {
        self.kill.is_killed()
    }

    /// Returns a handle that can kill this worker from another thread.
    #[must_use]
    pub fn kill_switch(&self) -> KillSwitch {
        self.kill.clone()
    }

    // -----------------------------------------------------------------------
    // Collaborators
    // -----------------------------------------------------------------------

    /// Looks up cached credentials for `info`, filling it in on a hit.
    pub fn check_cached_authentication(&mut self, info: &mut AuthInfo) -> bool {
        self.auth.check_cached(info)
    }

    /// Stores credentials in the auth store.
    pub fn cache_authentication(&mut self, info: &AuthInfo) -> bool {
        self.auth.cache(info)
    }

    /// Records an action the broker has temporarily authorised.
    pub fn add_temporary_authorization(&mut self, action: impl Into<String>) {
        self.temporary_authorizations.insert(action.into());
    }

    /// Returns the temporarily authorised actions.
    #[must_use]
    pub const fn temporary_authorizations(&self) -> &BTreeSet<String> {
        &self.temporary_authorizations
    }

    // -----------------------------------------------------------------------
    // Engine-facing plumbing
    // -----------------------------------------------------------------------

    pub(crate) fn send(&mut self, notification: &Notification) -> Result<(), ChannelError> {
        self.channel.send(notification)
    }

    pub(crate) fn receive(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<Command>, ChannelError> {
        self.channel.receive(timeout)
    }

    pub(crate) fn set_auth_store(&mut self, store: Box<dyn AuthStore>) {
        self.auth = store;
    }

    pub(crate) fn set_kill_switch(&mut self, kill: KillSwitch) {
        self.kill = kill;
    }

    pub(crate) fn merge_incoming(&mut self, entries: BTreeMap<String, String>) {
        debug!(
            target: SESSION_TARGET,
            keys = entries.len(),
            "merging incoming metadata"
        );
        self.incoming.merge(entries);
    }

    pub(crate) fn terminate(&mut self) {
        self.state = SessionState::Terminating;
    }

    /// Resets per-operation state before a handler runs.
    ///
    /// Dispatching an operation disarms the idle timer; the handler may arm
    /// it again.
    pub(crate) fn begin_operation(&mut self, selector: Selector) {
        let now = Instant::now();
        self.timer.cancel();
        self.stream = StreamTracker::default();
        self.listing.reset(now);
        self.state = SessionState::Dispatching(selector);
    }

    pub(crate) fn end_operation(&mut self) {
        if !self.is_terminating() {
            self.state = SessionState::Idle;
        }
    }

    pub(crate) fn flush_listing(&mut self) -> Result<(), ChannelError> {
        self.listing
            .take(Instant::now())
            .map_or(Ok(()), |entries| {
                self.send(&Notification::ListEntries { entries })
            })
    }

    /// Drops buffered listing entries and outgoing metadata after a failure.
    pub(crate) fn discard_pending(&mut self) {
        let dropped_entries = self.listing.len();
        let dropped_keys = self.outgoing.len();
        if dropped_entries > 0 || dropped_keys > 0 {
            warn!(
                target: SESSION_TARGET,
                dropped_entries,
                dropped_keys,
                "discarding buffered output of failed operation"
            );
        }
        self.listing.reset(Instant::now());
        self.outgoing.clear();
    }

    pub(crate) fn take_due_timer(&mut self, now: Instant) -> Option<Vec<u8>> {
        self.timer.take_due(now)
    }

    /// How long the idle loop may block before it must look at the timer
    /// or the kill switch again.
    pub(crate) fn idle_wait(&self, now: Instant, poll: Duration) -> Duration {
        self.timer
            .remaining(now)
            .map_or(poll, |remaining| remaining.min(poll))
    }
}

#[cfg(test)]
mod tests;
