//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Flags → Validate → Context → Config + migration → Supervisor → Gate → Scheduler
//!
//! Supervisor (supervisor.rs):
//!     Web failure → Log → Grace period → Shutdown::trigger(1)
//!
//! Shutdown (shutdown.rs):
//!     Trigger → main task leaves drive() with the exit code
//! ```
//!
//! # Design Decisions
//! - Ordered startup: settings first, then config, then tasks
//! - Only the main task decides the exit code

pub mod shutdown;
pub mod startup;
pub mod supervisor;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{drive, launch, launch_with, prepare, Bootstrap, Exit, Prepared};
pub use supervisor::{ServiceState, WebSupervisor};
