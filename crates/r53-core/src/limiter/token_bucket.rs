// # Token Bucket
//
// Steady-state rate limit with bounded bursts.
//
// Tokens refill lazily: every acquisition attempt first adds
// `elapsed * (max_calls / time_window)` tokens, capped at the bucket size.
// There is no background timer. All state lives behind one mutex owned by
// the bucket; nothing is shared between buckets.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{ClassifiedError, Result};

/// Upper bound on a single sleep inside [`TokenBucket::acquire_blocking`]
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
struct BucketState {
    available: f64,
    last_refill: Instant,
}

/// Token-bucket limiter
///
/// # Example
///
/// ```rust
/// use r53_core::limiter::TokenBucket;
/// use std::time::Duration;
///
/// let bucket = TokenBucket::new(5, Duration::from_secs(1)).unwrap();
/// for _ in 0..5 {
///     assert!(bucket.try_acquire(1));
/// }
/// assert!(!bucket.try_acquire(1));
/// ```
#[derive(Debug)]
pub struct TokenBucket {
    max_calls: u32,
    time_window: Duration,
    capacity: u32,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a bucket allowing `max_calls` per `time_window`, starting full
    pub fn new(max_calls: u32, time_window: Duration) -> Result<Self> {
        Self::with_bucket_size(max_calls, time_window, max_calls)
    }

    /// Create a bucket whose burst size differs from the per-window rate
    pub fn with_bucket_size(max_calls: u32, time_window: Duration, bucket_size: u32) -> Result<Self> {
        if max_calls == 0 {
            return Err(ClassifiedError::validation("Token bucket max_calls must be > 0"));
        }
        if time_window.is_zero() {
            return Err(ClassifiedError::validation("Token bucket time window must be > 0"));
        }
        if bucket_size == 0 {
            return Err(ClassifiedError::validation("Token bucket size must be > 0"));
        }

        Ok(Self {
            max_calls,
            time_window,
            capacity: bucket_size,
            refill_per_sec: f64::from(max_calls) / time_window.as_secs_f64(),
            state: Mutex::new(BucketState {
                available: f64::from(bucket_size),
                last_refill: Instant::now(),
            }),
        })
    }

    pub fn max_calls(&self) -> u32 {
        self.max_calls
    }

    pub fn time_window(&self) -> Duration {
        self.time_window
    }

    /// Maximum burst size
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Tokens added per second
    pub fn refill_rate(&self) -> f64 {
        self.refill_per_sec
    }

    /// Tokens available right now (refills first)
    pub fn available(&self) -> f64 {
        let mut state = self.lock();
        self.refill(&mut state);
        state.available
    }

    /// Take `n` tokens if they are available after refill
    ///
    /// Leaves the token count untouched on failure.
    pub fn try_acquire(&self, n: u32) -> bool {
        let mut state = self.lock();
        self.refill(&mut state);

        let wanted = f64::from(n);
        if state.available >= wanted {
            state.available -= wanted;
            true
        } else {
            false
        }
    }

    /// Wait until `n` tokens are taken or `timeout` elapses
    ///
    /// Sleeps for the shorter of [`POLL_INTERVAL`] and the estimated refill
    /// time between attempts. Returns `false` on timeout; never errors.
    /// `None`, or a timeout too far out to represent, waits without a
    /// deadline.
    pub async fn acquire_blocking(&self, n: u32, timeout: Option<Duration>) -> bool {
        if n > self.capacity {
            tracing::warn!(
                "Requested {} tokens from a bucket of capacity {}; request can never succeed",
                n,
                self.capacity
            );
            return false;
        }

        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        loop {
            if self.try_acquire(n) {
                return true;
            }

            let now = Instant::now();
            if let Some(deadline) = deadline
                && now >= deadline
            {
                tracing::debug!("Token bucket wait timed out after {:?}", timeout);
                return false;
            }

            let mut sleep_for = POLL_INTERVAL.min(self.time_until(n));
            if let Some(deadline) = deadline {
                sleep_for = sleep_for.min(deadline - now);
            }
            // A zero sleep would spin when the estimate rounds down.
            if sleep_for.is_zero() {
                sleep_for = Duration::from_millis(1);
            }

            tokio::time::sleep(sleep_for).await;
        }
    }

    /// Estimated time until `n` tokens are available
    fn time_until(&self, n: u32) -> Duration {
        let state = self.lock();
        let missing = (f64::from(n) - state.available).max(0.0);
        Duration::try_from_secs_f64(missing / self.refill_per_sec).unwrap_or(POLL_INTERVAL)
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        let added = elapsed * self.refill_per_sec;
        state.available = (state.available + added).min(f64::from(self.capacity));
        state.last_refill = now;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
