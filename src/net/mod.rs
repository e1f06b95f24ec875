//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Host name
//!     → resolver.rs (custom DNS, else system resolver, then backup DNS)
//!     → connectivity.rs (TCP probe until one target answers)
//!     → client.rs (outbound HTTP for IP discovery, providers, webhooks)
//! ```
//!
//! # Design Decisions
//! - Custom DNS and certificate policy come from RuntimeContext, not globals
//! - Backup DNS is installed once, after the web service was started
//! - The connectivity gate never times out

pub mod client;
pub mod connectivity;
pub mod resolver;

pub use client::build_client;
pub use connectivity::{ConnectivityGate, Probe, ProbeError, TcpProbe, DEFAULT_PROBE_TARGETS};
pub use resolver::{HostResolver, ResolverError};
