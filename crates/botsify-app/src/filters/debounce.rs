//! Cancel-and-reschedule single-shot timer slot.
//!
//! The slot tracks one pending Tokio task and a generation counter. Every
//! reschedule or cancel bumps the generation, so a task that already woke
//! up before it was aborted fails [`Debouncer::complete`] and must not
//! commit.

use std::time::Duration;
use tokio::task::JoinHandle;

/// Timer slot for one debounced field.
#[derive(Debug)]
pub(crate) struct Debouncer {
    delay: Duration,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            pending: None,
        }
    }

    pub(crate) fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancel any pending timer and hand out the generation for the next one.
    pub(crate) fn rearm(&mut self) -> u64 {
        self.cancel();
        self.generation
    }

    /// Record the task spawned for the current generation.
    pub(crate) fn track(&mut self, handle: JoinHandle<()>) {
        self.pending = Some(handle);
    }

    /// Abort the pending timer. Returns whether one was pending.
    pub(crate) fn cancel(&mut self) -> bool {
        self.generation = self.generation.wrapping_add(1);
        match self.pending.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Claim the fire for `generation`. Fails if the timer was superseded.
    pub(crate) fn complete(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.pending = None;
        self.generation = self.generation.wrapping_add(1);
        true
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rearm_supersedes_previous_generation() {
        let mut timer = Debouncer::new(Duration::from_millis(500));
        let first = timer.rearm();
        let second = timer.rearm();

        assert_ne!(first, second);
        assert!(!timer.complete(first));
        assert!(timer.complete(second));
    }

    #[test]
    fn test_complete_only_once() {
        let mut timer = Debouncer::new(Duration::from_millis(300));
        let generation = timer.rearm();
        assert!(timer.complete(generation));
        assert!(!timer.complete(generation));
    }

    #[test]
    fn test_cancel_invalidates() {
        let mut timer = Debouncer::new(Duration::from_millis(300));
        let generation = timer.rearm();
        assert!(!timer.cancel());
        assert!(!timer.complete(generation));
    }

    #[tokio::test]
    async fn test_cancel_aborts_tracked_task() {
        let mut timer = Debouncer::new(Duration::from_secs(60));
        timer.rearm();
        let handle = tokio::spawn(tokio::time::sleep(Duration::from_secs(60)));
        timer.track(handle);

        assert!(timer.is_pending());
        assert!(timer.cancel());
        assert!(!timer.is_pending());
    }
}
