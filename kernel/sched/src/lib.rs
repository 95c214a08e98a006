//! CPU scheduler for the Muon teaching kernel.
//!
//! Decides which ready thread runs next on a single processor, dispatches
//! the processor to it, and reclaims a finished thread only after control
//! has left its stack. Ready threads are ordered shortest-predicted-burst
//! first, with thread id breaking ties.
//!
//! Mutual exclusion is not a lock: every public operation requires the
//! caller to have already disabled interrupts, which on a uniprocessor is
//! equivalent to holding a global exclusive lock. A blocking lock cannot
//! be used here — waiting for it would call back into the scheduler and
//! deadlock. Every precondition is enforced by fatal assertion; there is
//! no recoverable error path in this subsystem.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod hal;
pub mod scheduler;

pub use hal::DispatchHal;
pub use scheduler::Scheduler;

pub use muon_core::id::ThreadId;
pub use muon_core::sched::ReadyQueue;
pub use muon_core::thread::{AddressSpace, Thread, ThreadStatus};
