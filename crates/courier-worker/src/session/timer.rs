//! Single-slot idle timer.

use std::time::{Duration, Instant};

#[derive(Debug)]
struct Armed {
    deadline: Instant,
    payload: Vec<u8>,
}

/// Holds at most one pending `special` payload and its deadline.
#[derive(Debug, Default)]
pub(crate) struct IdleTimer {
    armed: Option<Armed>,
}

impl IdleTimer {
    /// Arms the slot, replacing whatever was armed before.
    pub(crate) fn arm(&mut self, after: Duration, payload: Vec<u8>, now: Instant) {
        self.armed = Some(Armed {
            deadline: now + after,
            payload,
        });
    }

    pub(crate) fn cancel(&mut self) {
        self.armed = None;
    }

    pub(crate) const fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Time left before the deadline; zero once it has passed.
    pub(crate) fn remaining(&self, now: Instant) -> Option<Duration> {
        self.armed
            .as_ref()
            .map(|armed| armed.deadline.saturating_duration_since(now))
    }

    /// Disarms and returns the payload when the deadline has passed.
    pub(crate) fn take_due(&mut self, now: Instant) -> Option<Vec<u8>> {
        let due = self
            .armed
            .as_ref()
            .is_some_and(|armed| armed.deadline <= now);
        if due {
            return self.armed.take().map(|armed| armed.payload);
        }
        None
    }
}
