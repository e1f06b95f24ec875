//! Web configuration interface.
//!
//! # Data Flow
//! ```text
//! TCP connection (bound by the supervisor)
//!     → server.rs (Axum router, tracing, timeout)
//!     → auth.rs (public gate or session gate per route)
//!     → handlers.rs / assets.rs
//!     → ConfigStore, LogBuffer, webhook client
//! ```
//!
//! # Design Decisions
//! - Two gates: login and static files only check the WAN policy,
//!   everything else also needs a session cookie
//! - Sessions live in memory; a restart logs everyone out
//! - Saves go through migration and validation before touching disk

pub mod assets;
pub mod auth;
pub mod handlers;
pub mod pages;
pub mod server;

pub use auth::SessionStore;
pub use server::{AppState, WebError, WebServer};
