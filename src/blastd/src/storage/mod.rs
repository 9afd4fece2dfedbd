//! Durable buffer for editor activities.
//!
//! The buffer is the single source of truth for what has not yet reached the
//! remote endpoint: rows are appended unconsumed, read back in start order and
//! flipped to consumed in bulk once the remote acknowledges them.

mod activity;
mod buffer;
mod error;

pub use activity::{Activity, NewActivity, DEFAULT_EDITOR};
pub use buffer::ActivityBuffer;
pub use error::{BufferError, BufferResult};
