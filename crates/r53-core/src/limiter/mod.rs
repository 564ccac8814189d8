//! Call-rate limiters
//!
//! - [`TokenBucket`]: steady rate with bounded bursts, outcome-agnostic
//! - [`AdaptiveLimiter`]: pacing gate whose rate follows call outcomes
//!
//! Both serialize their own state behind a per-instance lock. There is no
//! cross-limiter or global lock.

pub mod adaptive;
pub mod token_bucket;

pub use adaptive::{AdaptiveLimiter, AdaptiveSettings, AdaptiveSnapshot};
pub use token_bucket::TokenBucket;

use std::sync::Arc;

/// A registered limiter instance
///
/// Cloning shares the underlying limiter.
#[derive(Debug, Clone)]
pub enum Limiter {
    TokenBucket(Arc<TokenBucket>),
    Adaptive(Arc<AdaptiveLimiter>),
}

impl Limiter {
    /// Short label for logging
    pub fn kind_name(&self) -> &'static str {
        match self {
            Limiter::TokenBucket(_) => "token_bucket",
            Limiter::Adaptive(_) => "adaptive",
        }
    }

    pub fn as_token_bucket(&self) -> Option<&Arc<TokenBucket>> {
        match self {
            Limiter::TokenBucket(bucket) => Some(bucket),
            Limiter::Adaptive(_) => None,
        }
    }

    pub fn as_adaptive(&self) -> Option<&Arc<AdaptiveLimiter>> {
        match self {
            Limiter::Adaptive(limiter) => Some(limiter),
            Limiter::TokenBucket(_) => None,
        }
    }
}

impl From<TokenBucket> for Limiter {
    fn from(bucket: TokenBucket) -> Self {
        Limiter::TokenBucket(Arc::new(bucket))
    }
}

impl From<AdaptiveLimiter> for Limiter {
    fn from(limiter: AdaptiveLimiter) -> Self {
        Limiter::Adaptive(Arc::new(limiter))
    }
}
