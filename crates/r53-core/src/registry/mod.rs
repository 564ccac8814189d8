//! Limiter registry
//!
//! Maps limiter names to shared limiter instances. A registry is an explicit
//! object handed to the executor; there is no process-global registry.
//!
//! ## Usage
//!
//! ```rust
//! use r53_core::registry::LimiterRegistry;
//! use r53_core::limiter::TokenBucket;
//! use std::time::Duration;
//!
//! // Defaults: "route53" (token bucket) and "route53_adaptive"
//! let registry = LimiterRegistry::with_defaults();
//! assert!(registry.contains("route53"));
//!
//! // Add or override at runtime
//! let bucket = TokenBucket::new(20, Duration::from_secs(1)).unwrap();
//! registry.register("bulk", bucket);
//! assert!(registry.contains("bulk"));
//! ```

use crate::config::LimitsConfig;
use crate::error::Result;
use crate::limiter::{AdaptiveLimiter, AdaptiveSettings, Limiter, TokenBucket};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of named limiters
///
/// ## Thread Safety
///
/// Reads are concurrent; registration takes the write lock. Registration is
/// expected to be rare and administrative, so steady-state traffic only ever
/// takes the read lock long enough to clone an `Arc`.
#[derive(Debug, Default)]
pub struct LimiterRegistry {
    limiters: RwLock<HashMap<String, Limiter>>,
}

impl LimiterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry populated from the default limits
    pub fn with_defaults() -> Self {
        // The built-in defaults always pass validation.
        Self::from_config(&LimitsConfig::default()).unwrap_or_else(|e| {
            tracing::error!("Default limiter configuration rejected: {}", e);
            Self::new()
        })
    }

    /// Create a registry from configuration
    pub fn from_config(config: &LimitsConfig) -> Result<Self> {
        config.validate()?;
        let registry = Self::new();

        for bucket in &config.token_buckets {
            let limiter = TokenBucket::with_bucket_size(
                bucket.max_calls,
                bucket.time_window(),
                bucket.bucket_size.unwrap_or(bucket.max_calls),
            )?;
            registry.register(bucket.name.clone(), limiter);
        }

        for adaptive in &config.adaptive {
            let limiter = AdaptiveLimiter::new(adaptive.settings)?;
            registry.register(adaptive.name.clone(), limiter);
        }

        Ok(registry)
    }

    /// Register or replace a limiter
    ///
    /// Returns the limiter previously registered under `name`, if any.
    pub fn register(&self, name: impl Into<String>, limiter: impl Into<Limiter>) -> Option<Limiter> {
        let name = name.into();
        let limiter = limiter.into();
        tracing::debug!("Registering {} limiter '{}'", limiter.kind_name(), name);

        let mut limiters = self.limiters.write().unwrap_or_else(PoisonError::into_inner);
        limiters.insert(name, limiter)
    }

    /// Register an adaptive limiter built from settings
    pub fn register_adaptive(&self, name: impl Into<String>, settings: AdaptiveSettings) -> Result<()> {
        let limiter = AdaptiveLimiter::new(settings)?;
        self.register(name, limiter);
        Ok(())
    }

    /// Look up a limiter by name
    pub fn get(&self, name: &str) -> Option<Limiter> {
        let limiters = self.limiters.read().unwrap_or_else(PoisonError::into_inner);
        limiters.get(name).cloned()
    }

    /// Check if a limiter is registered
    pub fn contains(&self, name: &str) -> bool {
        let limiters = self.limiters.read().unwrap_or_else(PoisonError::into_inner);
        limiters.contains_key(name)
    }

    /// List all registered limiter names, sorted
    pub fn names(&self) -> Vec<String> {
        let limiters = self.limiters.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = limiters.keys().cloned().collect();
        names.sort();
        names
    }
}
