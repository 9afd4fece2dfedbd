use crate::client::exporters::event_forward::{
    ActivityForward, Backoff, BackoffPolicy, EventForwardResult, SyncRequest,
};
use crate::config::Config;
use crate::storage::{Activity, ActivityBuffer};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Knobs of the forwarding engine.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub interval: Duration,
    pub batch_size: usize,
    pub backoff: BackoffPolicy,
    pub metrics_only: bool,
}

impl From<&Config> for SyncSettings {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.sync_interval(),
            batch_size: config.sync_batch_size,
            backoff: config.backoff_policy(),
            metrics_only: config.metrics_only,
        }
    }
}

/// What a single drain accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    pub batches: usize,
    pub activities: usize,
    /// Shutdown was observed while backing off; the backlog may not be empty.
    pub interrupted: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("no API token configured")]
    NoCredential,

    #[error("sync interrupted by shutdown")]
    Interrupted,
}

/// Drains the activity buffer to the remote endpoint.
///
/// Driven periodically by [`SyncManager::run`] and on demand through
/// [`SyncManager::sync_now`]. Both paths go through
/// [`SyncManager::drain_backlog`], which is serialised so a batch is never in
/// flight twice from the same process.
pub struct SyncManager {
    buffer: ActivityBuffer,
    forward: ActivityForward,
    settings: SyncSettings,
    cancellation_token: CancellationToken,
    drain_lock: Mutex<()>,
}

impl SyncManager {
    pub fn new(
        buffer: ActivityBuffer,
        forward: ActivityForward,
        settings: SyncSettings,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            buffer,
            forward,
            settings,
            cancellation_token,
            drain_lock: Mutex::new(()),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.forward.has_credential()
    }

    /// Drains once immediately, then on every tick until shutdown, then one
    /// final best-effort drain. Returns once that last drain finishes.
    pub async fn run(&self) {
        info!(
            "Sync loop started (interval: {:?}, batch size: {}, endpoint: {})",
            self.settings.interval,
            self.settings.batch_size,
            self.forward.endpoint()
        );

        self.drain_backlog().await;

        let period = self.settings.interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancellation_token.cancelled() => {
                    info!("Shutdown requested, flushing remaining activities");
                    self.drain_backlog().await;
                    break;
                }
                _ = ticker.tick() => {
                    debug!("Sync interval ticked");
                    self.drain_backlog().await;
                }
            }
        }

        info!("Sync loop stopped");
    }

    /// Runs one drain for a client that asked for it explicitly.
    pub async fn sync_now(&self) -> Result<DrainOutcome, SyncError> {
        if !self.has_credential() {
            return Err(SyncError::NoCredential);
        }

        let outcome = self.drain_backlog().await;
        if outcome.interrupted {
            return Err(SyncError::Interrupted);
        }
        Ok(outcome)
    }

    /// Forwards batches until the backlog is exhausted.
    ///
    /// Failures never escape: the same backlog is retried after an
    /// exponentially growing wait, and only a shutdown during that wait stops
    /// the drain early. Without a credential this is a silent no-op.
    pub async fn drain_backlog(&self) -> DrainOutcome {
        let mut outcome = DrainOutcome::default();
        if !self.has_credential() {
            info!("sync: no API token configured, skipping");
            return outcome;
        }

        let _guard = self.drain_lock.lock().await;
        let mut backoff = Backoff::new(self.settings.backoff);

        loop {
            match self.sync_batch().await {
                Ok(0) => return outcome,
                Ok(sent) => {
                    backoff.reset();
                    outcome.batches += 1;
                    outcome.activities += sent;

                    if sent < self.settings.batch_size {
                        return outcome;
                    }
                }
                Err(e) => {
                    let delay = backoff.increase();
                    warn!("sync: error (retrying in {:?}): {}", delay, e);

                    tokio::select! {
                        _ = self.cancellation_token.cancelled() => {
                            info!("sync: shutdown during backoff, giving up on this drain");
                            outcome.interrupted = true;
                            return outcome;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// Reads the next batch and forwards it. Returns how many activities were
    /// consumed; zero means the buffer is drained.
    async fn sync_batch(&self) -> EventForwardResult<usize> {
        let activities = self.buffer.unconsumed(self.settings.batch_size).await?;
        if activities.is_empty() {
            return Ok(0);
        }

        info!("sync: syncing {} activities", activities.len());
        self.forward_batch(&activities).await?;
        info!("sync: successfully synced {} activities", activities.len());
        Ok(activities.len())
    }

    /// Sends `activities` as one request and marks all of them consumed once
    /// the remote accepts it. The batch is consumed entirely or not at all.
    pub async fn forward_batch(&self, activities: &[Activity]) -> EventForwardResult<()> {
        let request = SyncRequest::from_activities(activities, self.settings.metrics_only);
        let response = self.forward.send_batch(&request).await?;

        if usize::try_from(response.count).ok() != Some(activities.len()) {
            debug!(
                "Remote reported {} stored activities for a batch of {}",
                response.count,
                activities.len()
            );
        }

        let ids: Vec<i64> = activities.iter().map(|activity| activity.id).collect();
        self.buffer.mark_consumed(&ids).await?;
        Ok(())
    }
}
