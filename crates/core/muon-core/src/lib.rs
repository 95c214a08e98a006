//! Core types for the Muon teaching kernel's scheduling subsystem.
//!
//! This crate contains the host-testable pieces the scheduler is built
//! from: typed identifiers, the thread descriptor, and the sorted ready
//! queue. By living outside the kernel crate, these types can be tested
//! with `cargo test` on the host without a kernel target.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod id;
pub mod sched;
pub mod thread;
