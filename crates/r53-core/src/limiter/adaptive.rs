// # Adaptive Limiter
//
// Feedback-controlled pacing gate.
//
// `await_turn` spaces calls `1 / current_rate` seconds apart; it never
// rejects, it only delays. The rate moves only through `report_success`
// (multiplicative recovery every fifth consecutive success) and
// `report_failure` (multiplicative backoff, steeper for throttle signals).
// The rate always stays within `[min_rate, max_rate]`.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{ClassifiedError, Result};

/// Backoff factor applied when the remote API reports throttling
pub const THROTTLE_BACKOFF_FACTOR: f64 = 0.25;

/// Consecutive successes needed before the rate recovers one step
pub const RECOVERY_STREAK: u64 = 5;

/// Tuning for an [`AdaptiveLimiter`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveSettings {
    /// Starting rate in calls per second
    #[serde(default = "default_initial_rate")]
    pub initial_rate: f64,
    #[serde(default = "default_min_rate")]
    pub min_rate: f64,
    #[serde(default = "default_max_rate")]
    pub max_rate: f64,
    /// Multiplier applied on non-throttle failures
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Multiplier applied after each recovery streak
    #[serde(default = "default_recovery_factor")]
    pub recovery_factor: f64,
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            initial_rate: default_initial_rate(),
            min_rate: default_min_rate(),
            max_rate: default_max_rate(),
            backoff_factor: default_backoff_factor(),
            recovery_factor: default_recovery_factor(),
        }
    }
}

impl AdaptiveSettings {
    /// Check bounds and factors
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.initial_rate,
            self.min_rate,
            self.max_rate,
            self.backoff_factor,
            self.recovery_factor,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(ClassifiedError::validation("Adaptive limiter settings must be finite"));
        }
        if self.min_rate <= 0.0 {
            return Err(ClassifiedError::validation("Adaptive limiter min_rate must be > 0"));
        }
        // The slowest pacing interval must fit in a Duration.
        if Duration::try_from_secs_f64(1.0 / self.min_rate).is_err() {
            return Err(ClassifiedError::validation(format!(
                "Adaptive limiter min_rate ({}) is too small",
                self.min_rate
            )));
        }
        if self.min_rate > self.max_rate {
            return Err(ClassifiedError::validation(format!(
                "Adaptive limiter min_rate ({}) exceeds max_rate ({})",
                self.min_rate, self.max_rate
            )));
        }
        if !(0.0..1.0).contains(&self.backoff_factor) || self.backoff_factor == 0.0 {
            return Err(ClassifiedError::validation(
                "Adaptive limiter backoff_factor must be in (0, 1)",
            ));
        }
        if self.recovery_factor <= 1.0 {
            return Err(ClassifiedError::validation(
                "Adaptive limiter recovery_factor must be > 1",
            ));
        }
        Ok(())
    }
}

fn default_initial_rate() -> f64 {
    2.0
}

fn default_min_rate() -> f64 {
    0.5
}

fn default_max_rate() -> f64 {
    10.0
}

fn default_backoff_factor() -> f64 {
    0.5
}

fn default_recovery_factor() -> f64 {
    1.1
}

/// Point-in-time view of the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveSnapshot {
    pub current_rate: f64,
    pub consecutive_successes: u64,
    pub consecutive_failures: u64,
}

#[derive(Debug)]
struct ControllerState {
    current_rate: f64,
    last_call: Option<Instant>,
    consecutive_successes: u64,
    consecutive_failures: u64,
}

/// Adaptive pacing limiter
#[derive(Debug)]
pub struct AdaptiveLimiter {
    settings: AdaptiveSettings,
    state: Mutex<ControllerState>,
}

impl AdaptiveLimiter {
    /// Create a limiter; the initial rate is clamped into the bounds
    pub fn new(settings: AdaptiveSettings) -> Result<Self> {
        settings.validate()?;

        let current_rate = settings.initial_rate.clamp(settings.min_rate, settings.max_rate);
        Ok(Self {
            settings,
            state: Mutex::new(ControllerState {
                current_rate,
                last_call: None,
                consecutive_successes: 0,
                consecutive_failures: 0,
            }),
        })
    }

    pub fn settings(&self) -> &AdaptiveSettings {
        &self.settings
    }

    pub fn current_rate(&self) -> f64 {
        self.lock().current_rate
    }

    pub fn snapshot(&self) -> AdaptiveSnapshot {
        let state = self.lock();
        AdaptiveSnapshot {
            current_rate: state.current_rate,
            consecutive_successes: state.consecutive_successes,
            consecutive_failures: state.consecutive_failures,
        }
    }

    /// Wait for this caller's slot
    ///
    /// Slots are reserved under the lock, so concurrent callers are granted
    /// consecutive slots `1 / current_rate` apart. The sleep happens after
    /// the lock is released. Returns how long the caller waited.
    pub async fn await_turn(&self) -> Duration {
        let slot = {
            let mut state = self.lock();
            let now = Instant::now();
            let interval = Duration::from_secs_f64(1.0 / state.current_rate);
            let slot = match state.last_call {
                Some(last) => last.checked_add(interval).map_or(now, |next| next.max(now)),
                None => now,
            };
            state.last_call = Some(slot);
            slot
        };

        let wait = slot.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            tracing::debug!("Adaptive limiter pacing call by {:?}", wait);
            tokio::time::sleep_until(slot).await;
        }
        wait
    }

    /// Record a successful call
    pub fn report_success(&self) {
        let mut state = self.lock();
        state.consecutive_successes += 1;
        state.consecutive_failures = 0;

        if state.consecutive_successes % RECOVERY_STREAK == 0 {
            let previous = state.current_rate;
            state.current_rate =
                (state.current_rate * self.settings.recovery_factor).min(self.settings.max_rate);
            if state.current_rate != previous {
                tracing::debug!(
                    "Adaptive limiter recovering: {:.2} -> {:.2} req/s",
                    previous,
                    state.current_rate
                );
            }
        }
    }

    /// Record a failed call; throttle signals back off harder
    pub fn report_failure(&self, is_throttle: bool) {
        let mut state = self.lock();
        state.consecutive_failures += 1;
        state.consecutive_successes = 0;

        let factor = if is_throttle {
            THROTTLE_BACKOFF_FACTOR
        } else {
            self.settings.backoff_factor
        };
        state.current_rate = (state.current_rate * factor).max(self.settings.min_rate);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
