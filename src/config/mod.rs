//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line
//!     → cli.rs (parse flags, accept single-dash long forms)
//!     → process.rs (ProcessConfig, immutable)
//!     → validation.rs (listen address)
//!     → RuntimeContext (write-once, shared via Arc)
//!
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → migrate.rs (normalize legacy layouts)
//!     → store.rs (cached snapshot, replaced on save)
//! ```
//!
//! # Design Decisions
//! - Process settings are immutable once parsed; collaborators receive them
//!   explicitly instead of reading process-wide state
//! - The persisted file is loaded at most once; saves publish a new snapshot
//! - Validation reports every problem, not just the first

pub mod cli;
pub mod loader;
pub mod migrate;
pub mod password;
pub mod process;
pub mod schema;
pub mod store;
pub mod validation;

pub use cli::Cli;
pub use loader::ConfigError;
pub use process::{ProcessConfig, RuntimeContext};
pub use schema::{CallbackConfig, DdnsConfig, DnsEntry, IpSource, WebhookConfig};
pub use store::ConfigStore;
