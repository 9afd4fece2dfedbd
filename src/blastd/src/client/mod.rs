pub mod exporters;
pub mod sync_manager;

pub use sync_manager::{DrainOutcome, SyncError, SyncManager, SyncSettings};
