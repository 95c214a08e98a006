//! The thread descriptor.
//!
//! A [`Thread`] carries everything the scheduler needs to order, dispatch,
//! and account for a thread: identity, execution status, timing counters,
//! the burst estimate used for ordering, an optional address space for
//! user-mode threads, and a stack fence for overflow detection.
//!
//! Descriptors are shared as `Arc<Thread>`. All mutable state lives in
//! atomics; it is only ever mutated under the interrupts-off discipline,
//! so plain relaxed accesses are used throughout.

use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use crate::id::ThreadId;

/// Magic value written below the stack at thread creation.
///
/// [`Thread::check_overflow`] verifies it is intact every time the thread
/// is descheduled. A clobbered fence means the stack grew past its
/// allocation at some point while the thread ran.
const STACK_FENCE: u64 = 0xDEAD_BEEF;

/// Execution state of a thread.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadStatus {
    /// Currently executing on the processor. At most one thread holds
    /// this status at any time.
    Running = 0,
    /// Runnable and present in the ready queue, exactly once.
    Ready = 1,
    /// Waiting on a resource, or created but not yet admitted.
    Blocked = 2,
    /// Terminated; awaiting reclamation once off its own stack.
    Finished = 3,
}

impl ThreadStatus {
    /// Converts a raw `u8` back to a status.
    const fn from_u8(val: u8) -> Self {
        match val {
            0 => Self::Running,
            1 => Self::Ready,
            3 => Self::Finished,
            _ => Self::Blocked,
        }
    }
}

/// Save/restore hooks for a user-mode thread's address space.
///
/// The scheduler invokes the save hooks on the outgoing thread before the
/// context switch (the stack in use changes after it) and the restore
/// hooks on the resumed thread after the switch returns. Kernel-only
/// threads have no address space and skip all four.
pub trait AddressSpace: Send + Sync {
    /// Saves the thread's user-mode register state.
    fn save_user_state(&self);
    /// Saves the address-space (MMU) state.
    fn save_state(&self);
    /// Restores the thread's user-mode register state.
    fn restore_user_state(&self);
    /// Restores the address-space (MMU) state.
    fn restore_state(&self);
}

/// Per-thread execution state, status, and timing counters.
///
/// The scheduler holds `Arc` clones of ready threads (it never owns them)
/// and takes the single owning reference of a finishing thread until the
/// thread is reclaimed. Dropping the last reference reclaims the
/// descriptor and everything it owns.
pub struct Thread {
    id: ThreadId,
    name: &'static str,
    status: AtomicU8,
    /// Ticks accumulated since this thread was last dispatched.
    run_time: AtomicU64,
    /// Estimated remaining CPU demand. Ordering key only.
    predicted_burst: AtomicU64,
    /// Tick value at last dispatch.
    last_update: AtomicU64,
    space: Option<Arc<dyn AddressSpace>>,
    stack_fence: AtomicU64,
}

impl Thread {
    /// Creates a kernel thread descriptor.
    ///
    /// New threads start [`ThreadStatus::Blocked`]: created but not yet
    /// admitted is indistinguishable from "not runnable". The burst
    /// estimate starts at zero, so a brand-new thread sorts ahead of
    /// everything with history.
    pub fn new(id: ThreadId, name: &'static str) -> Self {
        Self {
            id,
            name,
            status: AtomicU8::new(ThreadStatus::Blocked as u8),
            run_time: AtomicU64::new(0),
            predicted_burst: AtomicU64::new(0),
            last_update: AtomicU64::new(0),
            space: None,
            stack_fence: AtomicU64::new(STACK_FENCE),
        }
    }

    /// Attaches an address space, making this a user-mode thread.
    pub fn with_space(mut self, space: Arc<dyn AddressSpace>) -> Self {
        self.space = Some(space);
        self
    }

    /// Sets the initial burst estimate.
    pub fn with_burst_estimate(self, ticks: u64) -> Self {
        self.predicted_burst.store(ticks, Ordering::Relaxed);
        self
    }

    /// Returns the thread id.
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Returns the human-readable name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the current execution status.
    pub fn status(&self) -> ThreadStatus {
        ThreadStatus::from_u8(self.status.load(Ordering::Relaxed))
    }

    /// Sets the execution status.
    pub fn set_status(&self, status: ThreadStatus) {
        let old = self.status();
        self.status.store(status as u8, Ordering::Relaxed);
        log::trace!(
            target: "thread",
            "thread {} [{}]: {:?} -> {:?}",
            self.id, self.name, old, status
        );
    }

    /// Ticks accumulated since this thread was last dispatched.
    pub fn run_time(&self) -> u64 {
        self.run_time.load(Ordering::Relaxed)
    }

    /// Resets the run-time counter. Done by the scheduler at dispatch.
    pub fn reset_run_time(&self) {
        self.run_time.store(0, Ordering::Relaxed);
    }

    /// Charges `ticks` of processor time to this thread.
    ///
    /// Called from the external timer path while the thread runs.
    pub fn charge_ticks(&self, ticks: u64) {
        self.run_time.fetch_add(ticks, Ordering::Relaxed);
    }

    /// Returns the burst estimate used for ready-queue ordering.
    pub fn predicted_burst(&self) -> u64 {
        self.predicted_burst.load(Ordering::Relaxed)
    }

    /// Overwrites the burst estimate.
    pub fn set_predicted_burst(&self, ticks: u64) {
        self.predicted_burst.store(ticks, Ordering::Relaxed);
    }

    /// Folds an observed CPU burst into the estimate.
    ///
    /// Exponential average with weight 1/2: the new estimate is the mean
    /// of the observed burst and the previous estimate. Called by the
    /// yield/block paths when a measured burst ends; the scheduler itself
    /// never re-estimates.
    pub fn record_burst(&self, observed: u64) {
        let old = self.predicted_burst.load(Ordering::Relaxed);
        self.predicted_burst
            .store((observed + old) / 2, Ordering::Relaxed);
    }

    /// Tick value at this thread's last dispatch.
    pub fn last_update(&self) -> u64 {
        self.last_update.load(Ordering::Relaxed)
    }

    /// Records the tick value at dispatch.
    pub fn set_last_update(&self, tick: u64) {
        self.last_update.store(tick, Ordering::Relaxed);
    }

    /// Returns the address space, if this is a user-mode thread.
    pub fn address_space(&self) -> Option<&Arc<dyn AddressSpace>> {
        self.space.as_ref()
    }

    /// Verifies the stack fence is intact.
    ///
    /// Detection only: a clobbered fence is a fatal condition, not
    /// something the scheduler corrects.
    pub fn check_overflow(&self) {
        assert_eq!(
            self.stack_fence.load(Ordering::Relaxed),
            STACK_FENCE,
            "stack overflow detected on thread {} [{}]",
            self.id,
            self.name,
        );
    }

    /// Simulates a stack overflow by clobbering the fence word.
    #[cfg(any(test, feature = "test-support"))]
    fn clobber_stack_fence(&self) {
        self.stack_fence.store(0, Ordering::Relaxed);
    }
}

/// Test-only helpers for simulating corrupted thread state.
#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support {
    use super::Thread;

    /// Clobbers `thread`'s stack fence so `check_overflow` trips.
    pub fn clobber_stack_fence(thread: &Thread) {
        thread.clobber_stack_fence();
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status())
            .field("run_time", &self.run_time())
            .field("predicted_burst", &self.predicted_burst())
            .field("last_update", &self.last_update())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id={}, burst={})", self.name, self.id, self.predicted_burst())
    }
}
