//! Bounded backlog store
//!
//! Fixed-capacity FIFO of captured events shared by every interceptor of a
//! tracer.
//!
//! # Design
//!
//! ```text
//! interceptor ─┐
//! interceptor ─┼─► push() ──► [ oldest ... newest ] ──► snapshot()  (copy)
//! interceptor ─┘                 capacity-bounded   ──► drain_all() (take)
//!                                evicts oldest
//! ```
//!
//! Every operation is a single short critical section on one mutex, so a
//! drain takes exactly the events pushed before it acquired the lock and
//! leaves everything pushed afterwards in place.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use super::event::BacklogEvent;

/// Counters describing store activity since creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Events currently held
    pub len: usize,
    /// Maximum events held at once
    pub capacity: usize,
    /// Events ever pushed
    pub pushed: u64,
    /// Events dropped to make room for newer ones
    pub evicted: u64,
    /// Events handed out by drains
    pub drained: u64,
}

/// Thread-safe, fixed-capacity FIFO of backlog events
#[derive(Debug)]
pub struct BacklogStore {
    queue: Mutex<VecDeque<Arc<BacklogEvent>>>,
    capacity: usize,
    pushed: AtomicU64,
    evicted: AtomicU64,
    drained: AtomicU64,
}

impl BacklogStore {
    /// Create a store holding at most `capacity` events (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            pushed: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            drained: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an event, evicting and returning the oldest one if full
    pub fn push(&self, event: BacklogEvent) -> Option<Arc<BacklogEvent>> {
        let evicted = {
            let mut queue = self.queue.lock();
            let evicted = if queue.len() >= self.capacity {
                queue.pop_front()
            } else {
                None
            };
            queue.push_back(Arc::new(event));
            evicted
        };

        self.pushed.fetch_add(1, Ordering::Relaxed);
        if evicted.is_some() {
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        evicted
    }

    /// Copy of all held events, oldest first
    pub fn snapshot(&self) -> Vec<Arc<BacklogEvent>> {
        self.queue.lock().iter().cloned().collect()
    }

    /// Held events matching `predicate`, oldest first, without removing them
    pub fn filter<P>(&self, mut predicate: P) -> Vec<Arc<BacklogEvent>>
    where
        P: FnMut(&BacklogEvent) -> bool,
    {
        self.queue
            .lock()
            .iter()
            .filter(|event| predicate(event))
            .cloned()
            .collect()
    }

    /// Remove and return all held events, oldest first
    pub fn drain_all(&self) -> Vec<Arc<BacklogEvent>> {
        let events: Vec<_> = {
            let mut queue = self.queue.lock();
            queue.drain(..).collect()
        };
        self.drained.fetch_add(events.len() as u64, Ordering::Relaxed);
        events
    }

    /// Discard all held events
    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            len: self.len(),
            capacity: self.capacity,
            pushed: self.pushed.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
        }
    }
}

impl Default for BacklogStore {
    fn default() -> Self {
        Self::new(crate::DEFAULT_BACKLOG_CAPACITY)
    }
}
