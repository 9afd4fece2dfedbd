//! Local intake side of the daemon.
//!
//! Editor plugins connect to a Unix socket and exchange one JSON object per
//! line with [`DaemonServer`]. Activities are appended to the buffer, manual
//! syncs are admitted through the [`RateLimiter`] and handed to the sync
//! manager.

pub mod client;
pub mod daemon_run;
mod error;
mod handlers;
pub mod rate_limiter;
mod routes;
pub mod server;
mod state;
pub mod structs;

pub use client::{DaemonClient, DaemonConnection};
pub use error::IntakeError;
pub use rate_limiter::{RateLimited, RateLimiter};
pub use server::DaemonServer;
pub use state::DaemonState;
