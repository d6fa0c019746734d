//! Batching of directory entries.

use std::time::{Duration, Instant};

use courier_protocol::Entry;

/// Entries held back before a batch is sent.
pub(crate) const LISTING_BATCH_SIZE: usize = 100;
/// Longest a buffered entry waits before its batch is sent.
pub(crate) const LISTING_BATCH_INTERVAL: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub(crate) struct ListingBuffer {
    pending: Vec<Entry>,
    last_flush: Instant,
}

impl ListingBuffer {
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            pending: Vec::new(),
            last_flush: now,
        }
    }

    /// Buffers `entry` and returns a batch when one is due.
    pub(crate) fn push(&mut self, entry: Entry, now: Instant) -> Option<Vec<Entry>> {
        self.pending.push(entry);
        let full = self.pending.len() >= LISTING_BATCH_SIZE;
        let stale = now.saturating_duration_since(self.last_flush) >= LISTING_BATCH_INTERVAL;
        if full || stale {
            return self.take(now);
        }
        None
    }

    /// Returns everything buffered, or `None` when empty.
    pub(crate) fn take(&mut self, now: Instant) -> Option<Vec<Entry>> {
        self.last_flush = now;
        if self.pending.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending))
    }

    pub(crate) fn reset(&mut self, now: Instant) {
        self.pending.clear();
        self.last_flush = now;
    }

    pub(crate) const fn len(&self) -> usize {
        self.pending.len()
    }
}
