//! Leading-edge debounce for search-driven reloads.
//!
//! The first call of a burst fires at once. Calls arriving while the window is
//! open collapse into one trailing call, `wait` after the latest of them.

use std::time::Duration;

use tokio::time::Instant;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Now,
    Deferred(Instant),
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    wait: Duration,
    last_fired: Option<Instant>,
    pending: Option<Instant>,
}

impl Debouncer {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            last_fired: None,
            pending: None,
        }
    }

    /// An overdue trailing call that was never flushed is folded into this one,
    /// which then fires as the leading edge of a new burst.
    pub fn admit(&mut self, now: Instant) -> Admission {
        if self.pending.is_some_and(|deadline| now >= deadline) {
            self.pending = None;
            self.last_fired = Some(now);
            return Admission::Now;
        }
        let window_open = self
            .last_fired
            .is_some_and(|last| now < last + self.wait);
        if self.pending.is_none() && !window_open {
            self.last_fired = Some(now);
            return Admission::Now;
        }
        let deadline = now + self.wait;
        self.pending = Some(deadline);
        Admission::Deferred(deadline)
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending
    }

    /// Consumes the trailing call if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if now >= deadline => {
                self.pending = None;
                self.last_fired = Some(now);
                true
            }
            _ => false,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
