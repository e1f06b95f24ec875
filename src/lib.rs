//! Dynamic DNS agent.
//!
//! Keeps DNS records pointed at this host's public addresses and serves a
//! small web interface to edit the configuration.
//!
//! # Architecture Overview
//!
//! ```text
//!   flags ──▶ config::cli ──▶ lifecycle::prepare ──▶ lifecycle::launch
//!                                  │                       │
//!                       ConfigStore (cached TOML)          ├──▶ WebSupervisor ──▶ http (Axum)
//!                                  │                       │
//!                                  │                       └──▶ ConnectivityGate ──▶ UpdateScheduler
//!                                  │                                                     │
//!                                  └──────────────────────────────────▶ ddns::DnsSync ◀───┘
//!                                                                      (ip, provider, webhook)
//! ```

// Core subsystems
pub mod config;
pub mod ddns;
pub mod http;
pub mod net;
pub mod scheduler;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

/// Version reported by `-v`; set `DDNS_AGENT_VERSION` at build time.
pub const VERSION: &str = match option_env!("DDNS_AGENT_VERSION") {
    Some(version) => version,
    None => "DEV",
};

pub use config::{ConfigStore, DdnsConfig, ProcessConfig};
pub use lifecycle::{Exit, Shutdown};
