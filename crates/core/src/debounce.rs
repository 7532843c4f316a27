//! Deferred single-slot work scheduling
//!
//! Cooperative debouncing for the single-threaded session loop: the most
//! recent request wins, any pending one is dropped when a new request is
//! scheduled. Used for re-fitting on resize and for retrying fit-to-width
//! while the container is still unmeasured. The embedder polls
//! [`Debouncer::fire_due`] from its tick.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    pending: Option<(Instant, T)>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> Debouncer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `work` after `delay`, replacing any pending request.
    pub fn schedule(&mut self, delay: Duration, work: T) {
        self.pending = Some((Instant::now() + delay, work));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending work if its deadline has passed at `now`.
    pub fn fire_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now => self.pending.take().map(|(_, work)| work),
            _ => None,
        }
    }
}
