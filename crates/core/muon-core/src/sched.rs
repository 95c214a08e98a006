//! Scheduling primitives.
//!
//! Contains the sorted ready queue and its ordering policy. These types
//! are host-testable and used by the kernel's scheduler.

use alloc::collections::VecDeque;
use alloc::sync::Arc;

use crate::id::ThreadId;
use crate::thread::Thread;

/// Total order over ready threads: shortest predicted burst first, ties
/// broken by smaller thread id.
///
/// The structural front of the queue is always the minimum under this
/// order, so removal-of-front yields the shortest job. Ties are never
/// broken nondeterministically: equal bursts order by id on every run.
fn sort_key(thread: &Thread) -> (u64, ThreadId) {
    (thread.predicted_burst(), thread.id())
}

/// Ordered container of ready threads awaiting dispatch.
///
/// Holds `Arc` clones only — it never owns the threads it lists, and a
/// thread is present at most once. Insertion is an O(n) scan to the sort
/// position; removal of the front is O(1).
pub struct ReadyQueue {
    entries: VecDeque<Arc<Thread>>,
}

impl ReadyQueue {
    /// Creates an empty ready queue.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Number of ready threads.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no threads are ready.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the thread with `id` is in the queue.
    pub fn contains(&self, id: ThreadId) -> bool {
        self.entries.iter().any(|t| t.id() == id)
    }

    /// Inserts a thread at its sort position.
    ///
    /// Equal-key threads already queued sort ahead of the newcomer only
    /// through the id tie-break, so admission order never influences the
    /// total order. Double insertion is a fatal invariant break.
    pub fn insert(&mut self, thread: Arc<Thread>) {
        assert!(
            !self.contains(thread.id()),
            "thread {} is already in the ready queue",
            thread.id(),
        );
        let key = sort_key(&thread);
        let pos = self
            .entries
            .iter()
            .position(|t| sort_key(t) > key)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, thread);
    }

    /// Removes and returns the front (minimum) thread.
    pub fn pop_front(&mut self) -> Option<Arc<Thread>> {
        self.entries.pop_front()
    }

    /// Returns the front (minimum) thread without removing it.
    pub fn front(&self) -> Option<&Arc<Thread>> {
        self.entries.front()
    }

    /// Iterates the queue in order, front first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Thread>> {
        self.entries.iter()
    }
}

impl Default for ReadyQueue {
    fn default() -> Self {
        Self::new()
    }
}
