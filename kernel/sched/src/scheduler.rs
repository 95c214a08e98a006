//! Thread admission, selection, and dispatch.
//!
//! The [`Scheduler`] owns the ready queue, the current-thread reference,
//! and the single to-be-destroyed slot. All state is instance-owned so
//! tests can construct isolated schedulers; nothing here is a global.
//!
//! Destruction of a finishing thread is a two-step protocol. [`Scheduler::run`]
//! records the outgoing thread in the to-be-destroyed slot, and
//! [`Scheduler::check_to_be_destroyed`] reclaims it — but only after the
//! context switch has returned, because until then code is still executing
//! on the finishing thread's stack.

use alloc::sync::Arc;
use core::fmt;
use core::fmt::Write as _;
use core::sync::atomic::{AtomicBool, Ordering};

use muon_core::sched::ReadyQueue;
use muon_core::thread::{Thread, ThreadStatus};

use crate::hal::DispatchHal;

/// The per-kernel scheduler instance.
///
/// Created once at kernel start and alive for the process lifetime.
/// Dropping it drops the ready queue's references, never the threads.
pub struct Scheduler<H: DispatchHal> {
    hal: H,
    ready: ReadyQueue,
    /// The thread currently executing on the processor.
    current: Option<Arc<Thread>>,
    /// At most one finished thread awaiting reclamation. This is the only
    /// owning reference the scheduler ever holds.
    to_be_destroyed: Option<Arc<Thread>>,
    /// Raised when a more CPU-favorable thread becomes ready. The external
    /// dispatch timer polls and clears it; the scheduler only sets it.
    preempt_pending: AtomicBool,
}

impl<H: DispatchHal> Scheduler<H> {
    /// Creates a scheduler with an empty ready queue and no current thread.
    pub fn new(hal: H) -> Self {
        Self {
            hal,
            ready: ReadyQueue::new(),
            current: None,
            to_be_destroyed: None,
            preempt_pending: AtomicBool::new(false),
        }
    }

    /// Installs the initial kernel thread as the current thread.
    ///
    /// Fatal if a current thread already exists.
    pub fn bootstrap(&mut self, thread: Arc<Thread>) {
        assert!(
            self.hal.interrupts_disabled(),
            "scheduler entered with interrupts enabled"
        );
        assert!(
            self.current.is_none(),
            "bootstrap with a thread already running"
        );
        thread.set_status(ThreadStatus::Running);
        thread.reset_run_time();
        thread.set_last_update(self.hal.ticks());
        log::debug!(target: "sched", "bootstrap thread {} is now running", thread.name());
        self.current = Some(thread);
    }

    /// Returns the currently running thread, if any.
    pub fn current(&self) -> Option<&Arc<Thread>> {
        self.current.as_ref()
    }

    /// Marks `thread` ready and inserts it into the ready queue.
    ///
    /// If a thread is currently running and the admitted thread's burst
    /// estimate is strictly smaller, raises the preemption-request flag so
    /// the dispatch timer can force a yield at its next safe point. Never
    /// switches, and never clears the flag.
    ///
    /// Fatal if the thread is already ready.
    pub fn ready_to_run(&mut self, thread: Arc<Thread>) {
        assert!(
            self.hal.interrupts_disabled(),
            "scheduler entered with interrupts enabled"
        );
        assert_ne!(
            thread.status(),
            ThreadStatus::Ready,
            "thread {} is already ready",
            thread.id(),
        );

        thread.set_status(ThreadStatus::Ready);
        log::trace!(
            target: "sched",
            "tick {}: thread {} admitted to ready queue (run_time={}, burst={})",
            self.hal.ticks(),
            thread.id(),
            thread.run_time(),
            thread.predicted_burst(),
        );

        if let Some(current) = &self.current {
            if thread.predicted_burst() < current.predicted_burst() {
                self.preempt_pending.store(true, Ordering::Release);
            }
        }
        self.ready.insert(thread);
    }

    /// Returns the front of the ready queue without removing it.
    pub fn peek_next(&self) -> Option<&Arc<Thread>> {
        assert!(
            self.hal.interrupts_disabled(),
            "scheduler entered with interrupts enabled"
        );
        self.ready.front()
    }

    /// Removes and returns the next thread to dispatch.
    ///
    /// `None` if no thread is ready; calling again on an empty queue is
    /// side-effect free. The returned thread is no longer a member of the
    /// ready queue — the caller is responsible for its status transition.
    pub fn find_next_to_run(&mut self) -> Option<Arc<Thread>> {
        assert!(
            self.hal.interrupts_disabled(),
            "scheduler entered with interrupts enabled"
        );
        let thread = self.ready.pop_front()?;
        log::trace!(
            target: "sched",
            "tick {}: thread {} removed from ready queue (run_time={}, burst={})",
            self.hal.ticks(),
            thread.id(),
            thread.run_time(),
            thread.predicted_burst(),
        );
        Some(thread)
    }

    /// Dispatches the processor to `next`.
    ///
    /// When `finishing` is set the outgoing thread is marked finished and
    /// recorded for destruction; it is reclaimed only after the next
    /// switch return, never here. Otherwise the caller must already have
    /// transitioned the outgoing thread out of `Running` (to ready via
    /// [`ready_to_run`](Self::ready_to_run), or to blocked).
    ///
    /// The context switch inside this method is the sole suspension point
    /// in the subsystem; resumption lands just after it, with interrupts
    /// disabled, at which point whichever thread the most recent finishing
    /// dispatch marked is reclaimed and the resumed thread's user state is
    /// restored.
    pub fn run(&mut self, next: Arc<Thread>, finishing: bool) {
        assert!(
            self.hal.interrupts_disabled(),
            "scheduler entered with interrupts enabled"
        );
        assert!(
            self.to_be_destroyed.is_none(),
            "a finished thread is already pending destruction"
        );
        let Some(old) = self.current.take() else {
            panic!("dispatch with no current thread");
        };

        if finishing {
            old.set_status(ThreadStatus::Finished);
            self.to_be_destroyed = Some(old.clone());
        } else {
            assert_ne!(
                old.status(),
                ThreadStatus::Running,
                "outgoing thread {} was not transitioned before dispatch",
                old.id(),
            );
        }

        // Save before the switch: after it, the stack in use changes.
        if let Some(space) = old.address_space() {
            space.save_user_state();
            space.save_state();
        }
        old.check_overflow();

        // The single authoritative point at which "who is running" changes.
        next.set_status(ThreadStatus::Running);
        next.reset_run_time();
        next.set_last_update(self.hal.ticks());
        self.current = Some(next.clone());
        log::debug!(target: "sched", "switching from {} to {}", old.name(), next.name());

        self.hal.switch_context(&old, &next);

        // Back on `old`'s stack, whenever a later dispatch selected it.
        assert!(
            self.hal.interrupts_disabled(),
            "interrupts enabled after context switch"
        );
        log::trace!(target: "sched", "now in thread {}", old.name());

        // Only now is no code running on the finished thread's stack.
        self.check_to_be_destroyed();

        if let Some(space) = old.address_space() {
            space.restore_user_state();
            space.restore_state();
        }
    }

    /// Reclaims the pending finished thread, if any, and clears the slot.
    ///
    /// Invoked after every switch return; also called from a fresh
    /// thread's first-entry path, which never returns through
    /// [`run`](Self::run).
    pub fn check_to_be_destroyed(&mut self) {
        if let Some(finished) = self.to_be_destroyed.take() {
            log::trace!(
                target: "sched",
                "reclaiming finished thread {} [{}]",
                finished.id(),
                finished.name(),
            );
            drop(finished);
        }
    }

    /// Returns `true` if a preemption request is outstanding.
    pub fn preempt_pending(&self) -> bool {
        self.preempt_pending.load(Ordering::Acquire)
    }

    /// Clears the preemption-request flag. Done by the dispatch timer once
    /// it has acted on (or chosen to ignore) the request.
    pub fn clear_preempt_pending(&self) {
        self.preempt_pending.store(false, Ordering::Release);
    }

    /// Writes the ready-queue contents, in order, for debugging.
    pub fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "Ready list contents:")?;
        for thread in self.ready.iter() {
            writeln!(out, "  {thread}")?;
        }
        Ok(())
    }
}
