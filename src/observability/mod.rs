//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!
//! Consumers (logging.rs):
//!     → stderr (human readable)
//!     → LogBuffer (recent lines, served by /logs)
//!
//! Operator-facing wording (locale.rs):
//!     → Lang selected from the cached configuration
//! ```
//!
//! # Design Decisions
//! - One subscriber for the whole process, installed before startup
//! - The buffer is bounded; oldest lines are dropped first
//! - Locale is passed explicitly, never read from global state

pub mod locale;
pub mod logging;

pub use locale::{tr, Lang, Message};
pub use logging::{init_logging, LogBuffer};
