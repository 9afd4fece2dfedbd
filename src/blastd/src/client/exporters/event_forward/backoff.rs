use std::time::Duration;

/// Bounds of the exponential backoff applied between failed forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub min: Duration,
    pub max: Duration,
}

/// Backoff state for one drain.
///
/// Starts at zero; the first failure waits `min`, each consecutive failure
/// doubles the wait up to `max`, and a success resets it.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    current: Duration,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            current: Duration::ZERO,
        }
    }

    /// Registers a failure and returns how long to wait before retrying.
    pub fn increase(&mut self) -> Duration {
        self.current = if self.current.is_zero() {
            self.policy.min
        } else {
            self.current.saturating_mul(2).min(self.policy.max)
        };
        self.current
    }

    pub fn reset(&mut self) {
        self.current = Duration::ZERO;
    }

    #[cfg(test)]
    fn current(&self) -> Duration {
        self.current
    }
}
