//! Bounded, acknowledged work queue between the watcher and the
//! processing loop.
//!
//! Built on a bounded crossbeam channel plus an outstanding-task counter.
//! `push` blocks when the queue is full, so backpressure propagates to the
//! watcher thread and delays acknowledgment of new filesystem events.
//! `join` waits until every pushed item has been popped *and* acknowledged
//! with `task_done`, which is what shutdown drains on.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// FIFO queue of pending image paths with completion tracking
#[derive(Clone)]
pub struct WorkQueue {
    tx: Sender<PathBuf>,
    rx: Receiver<PathBuf>,
    outstanding: Arc<(Mutex<u64>, Condvar)>,
    capacity: usize,
}

impl WorkQueue {
    /// Create a queue that holds at most `capacity` un-popped items
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self {
            tx,
            rx,
            outstanding: Arc::new((Mutex::new(0), Condvar::new())),
            capacity,
        }
    }

    /// Enqueue a path, blocking while the queue is at capacity.
    ///
    /// The item counts as outstanding until the consumer calls
    /// [`WorkQueue::task_done`] for it.
    pub fn push(&self, path: PathBuf) {
        {
            let (lock, _) = &*self.outstanding;
            *guard(lock) += 1;
        }
        // Cannot disconnect: every clone of the queue holds a receiver
        let _ = self.tx.send(path);
    }

    /// Dequeue the next path, waiting up to `timeout`.
    ///
    /// `None` on timeout lets the consumer re-check its running flag.
    #[must_use]
    pub fn pop(&self, timeout: Duration) -> Option<PathBuf> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Acknowledge one popped item as fully handled.
    ///
    /// Exactly one call per popped item, whatever the outcome of the cycle.
    pub fn task_done(&self) {
        let (lock, cvar) = &*self.outstanding;
        let mut count = guard(lock);
        *count = count.saturating_sub(1);
        if *count == 0 {
            cvar.notify_all();
        }
    }

    /// Wait until every pushed item has been acknowledged.
    ///
    /// Returns `false` if `timeout` elapses with work still outstanding.
    #[must_use]
    pub fn join(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let (lock, cvar) = &*self.outstanding;
        let mut count = guard(lock);

        while *count > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (next, _) = cvar
                .wait_timeout(count, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            count = next;
        }
        true
    }

    /// Number of items currently queued (popped items not included)
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Configured capacity
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Lock the counter, recovering from poisoning (the counter is always valid)
fn guard(lock: &Mutex<u64>) -> MutexGuard<'_, u64> {
    lock.lock().unwrap_or_else(|e| e.into_inner())
}
