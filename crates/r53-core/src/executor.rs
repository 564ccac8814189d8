//! Protected-call executor
//!
//! Runs one remote call under a named limiter and classifies its failure.
//!
//! ## Contract
//!
//! ```text
//! resolve limiter ──► acquire (bucket) / await turn (adaptive)
//!                          │
//!                          ▼
//!                  invoke operation once
//!                          │
//!            ┌─────────────┴─────────────┐
//!            ▼                           ▼
//!     report_success()         classify ─► report_failure(throttled?)
//!            │                           │
//!            ▼                           ▼
//!         Ok(value)               Err(ClassifiedError)
//! ```
//!
//! - An unknown limiter name fails open: the call runs unthrottled and a
//!   warning is logged.
//! - The executor never retries. Retry policy belongs to the caller and is
//!   driven by [`ErrorKind`](crate::error::ErrorKind).
//! - Only adaptive limiters receive outcome reports.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::classify::{RemoteFailure, classify};
use crate::config::{ADAPTIVE_SUFFIX, LimitsConfig};
use crate::error::{ClassifiedError, Result};
use crate::limiter::Limiter;
use crate::registry::LimiterRegistry;

/// Which limiter flavor a call asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Use the limiter registered under the plain name
    TokenBucket,
    /// Use the limiter registered under `{name}_adaptive`
    Adaptive,
}

impl Pacing {
    /// Registry key for `limiter_name` under this pacing
    pub fn registry_key(self, limiter_name: &str) -> String {
        match self {
            Pacing::TokenBucket => limiter_name.to_string(),
            Pacing::Adaptive => format!("{}{}", limiter_name, ADAPTIVE_SUFFIX),
        }
    }
}

/// Executes remote calls under rate limiting and error classification
///
/// Cheap to clone; clones share the registry and counters.
#[derive(Debug, Clone)]
pub struct ProtectedExecutor {
    registry: Arc<LimiterRegistry>,
    acquire_timeout: Duration,
    unthrottled_calls: Arc<AtomicU64>,
}

impl ProtectedExecutor {
    /// Default ceiling on waiting for token-bucket capacity
    pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(registry: Arc<LimiterRegistry>) -> Self {
        Self::with_acquire_timeout(registry, Self::DEFAULT_ACQUIRE_TIMEOUT)
    }

    pub fn with_acquire_timeout(registry: Arc<LimiterRegistry>, acquire_timeout: Duration) -> Self {
        Self {
            registry,
            acquire_timeout,
            unthrottled_calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Build a registry and executor from configuration
    pub fn from_config(config: &LimitsConfig) -> Result<Self> {
        let registry = LimiterRegistry::from_config(config)?;
        Ok(Self::with_acquire_timeout(
            Arc::new(registry),
            config.acquire_timeout(),
        ))
    }

    pub fn registry(&self) -> &Arc<LimiterRegistry> {
        &self.registry
    }

    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }

    /// Number of calls that ran without a limiter because the name was unknown
    pub fn unthrottled_calls(&self) -> u64 {
        self.unthrottled_calls.load(Ordering::Relaxed)
    }

    /// Run `operation` once under the limiter `limiter_name` selected by `pacing`
    ///
    /// # Returns
    ///
    /// - `Ok(T)`: the operation's result
    /// - `Err(ClassifiedError)`: the classified operation failure, or a
    ///   `Timeout` if token-bucket capacity never arrived (the operation is
    ///   not invoked in that case)
    pub async fn execute<T, E, F, Fut>(
        &self,
        limiter_name: &str,
        pacing: Pacing,
        operation: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<RemoteFailure>,
    {
        let key = pacing.registry_key(limiter_name);

        let Some(limiter) = self.registry.get(&key) else {
            self.unthrottled_calls.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                "Rate limiter '{}' not found, proceeding without rate limiting",
                key
            );
            return operation().await.map_err(|e| Self::classify_failure(&key, e.into()));
        };

        match limiter {
            Limiter::TokenBucket(bucket) => {
                if !bucket.acquire_blocking(1, Some(self.acquire_timeout)).await {
                    tracing::error!(
                        "Rate limiter '{}' timeout after {:?} - request rejected",
                        key,
                        self.acquire_timeout
                    );
                    return Err(ClassifiedError::timeout(format!(
                        "Rate limiter '{}' timed out after {:?} waiting for capacity",
                        key, self.acquire_timeout
                    )));
                }

                operation().await.map_err(|e| Self::classify_failure(&key, e.into()))
            }
            Limiter::Adaptive(adaptive) => {
                adaptive.await_turn().await;

                match operation().await {
                    Ok(value) => {
                        adaptive.report_success();
                        Ok(value)
                    }
                    Err(e) => {
                        let err = Self::classify_failure(&key, e.into());
                        adaptive.report_failure(err.is_throttle());
                        if err.is_throttle() {
                            tracing::warn!(
                                "Throttling detected, reducing '{}' rate to {:.2} req/s",
                                key,
                                adaptive.current_rate()
                            );
                        }
                        Err(err)
                    }
                }
            }
        }
    }

    fn classify_failure(key: &str, failure: RemoteFailure) -> ClassifiedError {
        let err = classify(failure);
        tracing::error!("Remote call under '{}' failed: {}", key, err);
        err
    }
}
