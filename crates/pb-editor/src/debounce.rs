//! Coalescing of history steps for rapid content edits.
//!
//! A generation counter stands in for a cancellable timer: every request
//! bumps the generation and hands back a [`DebounceTicket`]. Only the ticket
//! carrying the latest generation can fire, so a burst of edits records one
//! history step. The pending step keeps the document as it was before the
//! *first* edit of the burst.

use pb_core::Document;
use std::time::{Duration, Instant};

/// Handle for one debounced request. Firing a stale ticket does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DebounceTicket(u64);

impl DebounceTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Pending {
    before: Document,
    deadline: Instant,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    generation: u64,
    pending: Option<Pending>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            generation: 0,
            pending: None,
        }
    }

    /// Register an edit made at `now`. `before` is only called when no step
    /// is pending yet; it should return the document prior to the edit.
    pub fn request(&mut self, now: Instant, before: impl FnOnce() -> Document) -> DebounceTicket {
        self.generation += 1;
        let deadline = now + self.quiet;
        match &mut self.pending {
            Some(pending) => pending.deadline = deadline,
            None => {
                self.pending = Some(Pending {
                    before: before(),
                    deadline,
                })
            }
        }
        DebounceTicket(self.generation)
    }

    /// Timer callback. Yields the pending step only for the latest ticket.
    pub fn fire(&mut self, ticket: DebounceTicket) -> Option<Document> {
        if ticket.0 != self.generation {
            log::trace!("debounce: stale ticket {} (latest {})", ticket.0, self.generation);
            return None;
        }
        self.take()
    }

    /// Yield the pending step once its quiet period has elapsed at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<Document> {
        match &self.pending {
            Some(pending) if pending.deadline <= now => self.take(),
            _ => None,
        }
    }

    /// Yield the pending step immediately, whatever its deadline.
    pub fn take(&mut self) -> Option<Document> {
        self.pending.take().map(|p| p.before)
    }

    /// Drop the pending step without recording it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}
