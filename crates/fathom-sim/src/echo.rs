//! Echo return scheduling.
//!
//! Echoes are queued with a future arrival time and drained once the
//! simulation clock reaches it.

use fathom_core::events::EchoEvent;

#[derive(Debug, Default)]
pub struct EchoScheduler {
    pending: Vec<EchoEvent>,
}

impl EchoScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, echo: EchoEvent) {
        self.pending.push(echo);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Remove and return every echo arriving at or before `now`, earliest first.
    pub fn flush(&mut self, now: f64) -> Vec<EchoEvent> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|e| e.arrival_time <= now);
        self.pending = pending;
        due.sort_by(|a, b| a.arrival_time.total_cmp(&b.arrival_time));
        due
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
