//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Connectivity probe fails:
//!     → backoff.rs (bounded, jittered delay before the next probe)
//! ```
//!
//! # Design Decisions
//! - Delays are capped; waiting has no overall deadline
//! - Jitter spreads probes from many agents behind the same outage

pub mod backoff;
