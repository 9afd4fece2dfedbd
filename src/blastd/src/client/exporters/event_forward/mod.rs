//! Forwarding of buffered activities to the remote collection endpoint.
//!
//! The outbound wire format ([`ActivityPayload`], camelCase) is kept apart
//! from the snake_case intake format the daemon accepts locally.
//!
//! # Example
//!
//! ```rust,no_run
//! # use blastd::client::exporters::event_forward::{ActivityForward, SyncRequest};
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let forwarder = ActivityForward::new("https://blast.example.com", "token");
//! let response = forwarder
//!     .send_batch(&SyncRequest { activities: vec![] })
//!     .await?;
//! assert!(response.success);
//! # Ok(())
//! # }
//! ```

mod backoff;
mod client;
mod error;
mod payload;

pub use backoff::{Backoff, BackoffPolicy};
pub use client::ActivityForward;
pub use error::{EventForwardError, EventForwardResult};
pub use payload::{ActivityPayload, SyncRequest, SyncResponse, SyncedActivity};
