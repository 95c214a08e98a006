//! Hardware collaborators consumed by the scheduler.
//!
//! The scheduler never touches hardware directly. Everything it needs
//! from the machine — the interrupt-disable flag, the timer tick counter,
//! and the register/stack context switch — comes in through
//! [`DispatchHal`], so the dispatch logic can be exercised on the host
//! with a simulated switch that just swaps which thread is logically
//! active.

use muon_core::thread::Thread;

/// Interrupt, timer, and context-switch services required for dispatch.
pub trait DispatchHal {
    /// Returns `true` if asynchronous interrupts are currently disabled.
    ///
    /// Asserted true on entry to every scheduler operation, and again
    /// immediately after [`switch_context`](Self::switch_context) returns.
    fn interrupts_disabled(&self) -> bool;

    /// Monotonically increasing timer tick counter.
    fn ticks(&self) -> u64;

    /// Transfers the processor from `from`'s execution context to `to`'s.
    ///
    /// The sole suspension point in the scheduling subsystem. The call
    /// does not return until some later dispatch switches back to the
    /// calling context; resumption lands exactly after this call, with
    /// interrupts disabled. It never fails and is never cancelled.
    ///
    /// A simulated implementation returns immediately, which models the
    /// calling context being resumed at once.
    fn switch_context(&self, from: &Thread, to: &Thread);
}

impl<H: DispatchHal + ?Sized> DispatchHal for &H {
    fn interrupts_disabled(&self) -> bool {
        (**self).interrupts_disabled()
    }

    fn ticks(&self) -> u64 {
        (**self).ticks()
    }

    fn switch_context(&self, from: &Thread, to: &Thread) {
        (**self).switch_context(from, to);
    }
}
