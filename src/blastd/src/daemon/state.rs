use crate::client::SyncManager;
use crate::daemon::rate_limiter::RateLimiter;
use crate::storage::ActivityBuffer;
use std::sync::Arc;

/// Everything a connection handler needs, shared by all connections.
#[derive(Clone)]
pub struct DaemonState {
    buffer: ActivityBuffer,
    machine: Arc<str>,
    sync_manager: Arc<SyncManager>,
    rate_limiter: Arc<RateLimiter>,
}

impl DaemonState {
    pub fn new(
        buffer: ActivityBuffer,
        machine: &str,
        sync_manager: Arc<SyncManager>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            buffer,
            machine: Arc::from(machine),
            sync_manager,
            rate_limiter,
        }
    }

    pub fn buffer(&self) -> &ActivityBuffer {
        &self.buffer
    }

    /// Identity stamped on every activity, whatever the client sent.
    pub fn machine(&self) -> &str {
        &self.machine
    }

    pub fn sync_manager(&self) -> &SyncManager {
        &self.sync_manager
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}
