use crate::constants::{SYNC_RATE_LIMIT, SYNC_RATE_WINDOW};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// A manual sync was refused; the next one is admitted after `retry_after`.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("rate limited: try again in {}", format_wait(.retry_after))]
pub struct RateLimited {
    pub retry_after: Duration,
}

/// Sliding-window admission control: at most `limit` admissions within any
/// trailing `window`.
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    admitted: Mutex<VecDeque<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(SYNC_RATE_LIMIT, SYNC_RATE_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            admitted: Mutex::new(VecDeque::with_capacity(limit)),
        }
    }

    /// Fails when the window is already full. Does not count as an attempt.
    pub fn check(&self) -> Result<(), RateLimited> {
        self.check_at(Instant::now())
    }

    /// Counts an attempt at the current instant.
    pub fn record(&self) {
        self.record_at(Instant::now())
    }

    /// Check and record under a single lock, so two concurrent callers cannot
    /// both pass the check before either is counted.
    pub fn acquire(&self) -> Result<(), RateLimited> {
        self.acquire_at(Instant::now())
    }

    pub fn check_at(&self, now: Instant) -> Result<(), RateLimited> {
        let mut admitted = self.lock();
        self.prune(&mut admitted, now);
        self.admission(&admitted, now)
    }

    pub fn record_at(&self, now: Instant) {
        let mut admitted = self.lock();
        self.prune(&mut admitted, now);
        admitted.push_back(now);
    }

    pub fn acquire_at(&self, now: Instant) -> Result<(), RateLimited> {
        let mut admitted = self.lock();
        self.prune(&mut admitted, now);
        self.admission(&admitted, now)?;
        admitted.push_back(now);
        Ok(())
    }

    fn admission(&self, admitted: &VecDeque<Instant>, now: Instant) -> Result<(), RateLimited> {
        if admitted.len() < self.limit {
            return Ok(());
        }
        let retry_after = admitted
            .front()
            .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
            .unwrap_or(self.window);
        Err(RateLimited { retry_after })
    }

    fn prune(&self, admitted: &mut VecDeque<Instant>, now: Instant) {
        while admitted
            .front()
            .is_some_and(|oldest| now.saturating_duration_since(*oldest) >= self.window)
        {
            admitted.pop_front();
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        // the queue stays consistent even if a holder panicked
        self.admitted.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Renders a wait rounded to whole seconds, e.g. `9m58s`, `45s`, `1h0m0s`.
fn format_wait(wait: &Duration) -> String {
    let secs = (wait.as_millis() + 500) / 1000;
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const WINDOW: Duration = Duration::from_secs(600);

    #[test]
    fn test_eleventh_request_in_window_is_refused() {
        let limiter = RateLimiter::new(10, WINDOW);
        let start = Instant::now();

        for i in 0..10 {
            let now = start + Duration::from_secs(i * 10);
            assert!(limiter.acquire_at(now).is_ok(), "request {i} refused");
        }

        let now = start + Duration::from_secs(100);
        let refused = limiter.acquire_at(now).unwrap_err();
        assert_eq!(refused.retry_after, Duration::from_secs(500));
    }

    #[test]
    fn test_admitted_again_once_oldest_ages_out() {
        let limiter = RateLimiter::new(10, WINDOW);
        let start = Instant::now();
        for i in 0..10 {
            limiter.record_at(start + Duration::from_secs(i));
        }

        assert!(limiter.check_at(start + WINDOW - Duration::from_millis(1)).is_err());
        assert!(limiter.check_at(start + WINDOW).is_ok());
        assert!(limiter.acquire_at(start + WINDOW).is_ok());
        // the second oldest is still in the window
        assert!(limiter.acquire_at(start + WINDOW).is_err());
    }

    #[test]
    fn test_refusals_are_not_counted() {
        let limiter = RateLimiter::new(1, WINDOW);
        let start = Instant::now();

        limiter.acquire_at(start).unwrap();
        for i in 1..5 {
            assert!(limiter.acquire_at(start + Duration::from_secs(i)).is_err());
        }
        assert!(limiter.acquire_at(start + WINDOW).is_ok());
    }

    #[test]
    fn test_check_does_not_record() {
        let limiter = RateLimiter::new(1, WINDOW);
        let now = Instant::now();

        assert!(limiter.check_at(now).is_ok());
        assert!(limiter.check_at(now).is_ok());
        limiter.record_at(now);
        assert!(limiter.check_at(now).is_err());
    }

    #[test]
    fn test_concurrent_acquires_never_exceed_limit() {
        let limiter = std::sync::Arc::new(RateLimiter::new(10, WINDOW));
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || limiter.acquire().is_ok())
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 10);
    }

    #[rstest]
    #[case(Duration::from_secs(598), "9m58s")]
    #[case(Duration::from_millis(44_600), "45s")]
    #[case(Duration::from_secs(600), "10m0s")]
    #[case(Duration::from_secs(3600), "1h0m0s")]
    #[case(Duration::ZERO, "0s")]
    fn test_refusal_message(#[case] retry_after: Duration, #[case] expected: &str) {
        assert_eq!(
            RateLimited { retry_after }.to_string(),
            format!("rate limited: try again in {expected}")
        );
    }
}
