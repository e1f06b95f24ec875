//! DNS synchronization subsystem.
//!
//! # Data Flow
//! ```text
//! UpdateScheduler tick
//!     → sync.rs (one cycle over every configured entry)
//!     → ip.rs (public address from HTTP endpoints, unchanged-IP cache)
//!     → provider.rs (push records that need it)
//!     → webhook.rs (notify when something was pushed or failed)
//! ```
//!
//! # Design Decisions
//! - Every cycle reads the latest configuration snapshot
//! - Unchanged addresses are re-pushed after `cache_times` skips
//! - A failed push clears the cache entry so the next cycle retries
//! - Errors stay inside the cycle; they are logged and reported, never raised

pub mod ip;
pub mod provider;
pub mod sync;
pub mod webhook;

pub use ip::{IpCache, IpFamily};
pub use provider::{Provider, ProviderError};
pub use sync::DnsSync;
pub use webhook::{Notification, UpdateStatus, WebhookError};
