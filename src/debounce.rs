//! Cancelable debounce — coalesces rapid triggers into one deferred value.
//!
//! The previewer uses this between search keystrokes and the annotate pass:
//! replacing the pending value restarts the quiet period, so only the
//! newest value ever fires (last-writer-wins, never a queue).

use std::time::{Duration, Instant};

/// Holds the latest scheduled value until a quiet period has elapsed.
#[derive(Debug)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    /// Creates a debouncer with the given quiet period.
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedules `value`, replacing any pending one and restarting the
    /// timer.
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Drops the pending value without waiting for the deadline, returning
    /// it so the caller can still apply it immediately.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    /// Takes the pending value if its quiet period has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.cancel(),
            _ => None,
        }
    }

    /// Instant the pending value becomes due, if one is scheduled.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
            .as_ref()
            .map(|(_, scheduled)| *scheduled + self.delay)
    }

    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
