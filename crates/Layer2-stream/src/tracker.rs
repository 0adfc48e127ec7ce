//! Completion tracking across source readers
//!
//! Counts readers that may still produce lines. Readers decrement when an
//! instance stops and increment when it resumes after a restart, so the
//! count can rise again after dropping. A plain countdown primitive can't
//! express that, hence a mutex-guarded counter with a notify used as a
//! condition variable.

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct CompletionTracker {
    running: Mutex<usize>,
    reached_zero: Notify,
}

impl CompletionTracker {
    /// Tracker with `running` readers active
    pub fn new(running: usize) -> Self {
        Self {
            running: Mutex::new(running),
            reached_zero: Notify::new(),
        }
    }

    pub fn running(&self) -> usize {
        *self.running.lock()
    }

    /// A reader resumed streaming
    pub fn increment(&self) {
        let mut running = self.running.lock();
        *running += 1;
        debug!("Reader resumed, {} running", *running);
    }

    /// A reader stopped streaming
    pub fn decrement(&self) {
        let mut running = self.running.lock();
        if *running == 0 {
            warn!("Completion tracker decremented below zero, ignoring");
            return;
        }

        *running -= 1;
        debug!("Reader stopped, {} running", *running);
        if *running == 0 {
            self.reached_zero.notify_waiters();
        }
    }

    /// Wait until no reader is running
    pub async fn wait_for_zero(&self) {
        loop {
            // Register before checking so a decrement in between is not lost
            let notified = self.reached_zero.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if *self.running.lock() == 0 {
                return;
            }
            notified.await;
        }
    }
}
