//! Update scheduling subsystem.
//!
//! # Data Flow
//! ```text
//! Connectivity gate opens
//!     → timer.rs (tick immediately, then every interval)
//!     → spawn UpdateCycle::run_cycle (one task per tick)
//! ```
//!
//! # Design Decisions
//! - Ticks are fixed to the clock; a slow cycle never delays the next one
//! - Missed ticks are skipped rather than fired in a burst
//! - The loop never returns; the process ends through other paths

pub mod timer;

pub use timer::{UpdateCycle, UpdateScheduler};
