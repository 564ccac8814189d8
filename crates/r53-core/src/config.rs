//! Configuration types for hosted-zone automation
//!
//! This module defines the configuration structures shared by the library
//! and the `r53ctl` binary. Every section has serde defaults, so an empty
//! JSON object is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ClassifiedError, Result};
use crate::limiter::AdaptiveSettings;

/// Name of the default token-bucket limiter for the hosted-zone service
pub const DEFAULT_LIMITER: &str = "route53";

/// Suffix appended to a limiter name to select its adaptive twin
pub const ADAPTIVE_SUFFIX: &str = "_adaptive";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Limiter registry contents
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Record defaults
    #[serde(default)]
    pub records: RecordDefaults,

    /// Which hosted-zone backend to talk to
    #[serde(default)]
    pub backend: BackendConfig,
}

impl AutomationConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClassifiedError::validation(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            ClassifiedError::validation(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.limits.validate()?;
        self.records.validate()?;
        self.backend.validate()?;
        Ok(())
    }
}

/// Limiter registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Token-bucket limiters
    #[serde(default = "default_token_buckets")]
    pub token_buckets: Vec<TokenBucketConfig>,

    /// Adaptive limiters
    #[serde(default = "default_adaptive")]
    pub adaptive: Vec<AdaptiveLimiterConfig>,

    /// Longest time a call waits for token-bucket capacity (in seconds)
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: f64,
}

impl LimitsConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.acquire_timeout_secs)
    }

    /// Validate limiter entries
    pub fn validate(&self) -> Result<()> {
        if !self.acquire_timeout_secs.is_finite() || self.acquire_timeout_secs <= 0.0 {
            return Err(ClassifiedError::validation(
                "acquire_timeout_secs must be a positive number",
            ));
        }
        if Duration::try_from_secs_f64(self.acquire_timeout_secs).is_err() {
            return Err(ClassifiedError::validation(format!(
                "acquire_timeout_secs ({}) is out of range",
                self.acquire_timeout_secs
            )));
        }

        for bucket in &self.token_buckets {
            bucket.validate()?;
        }
        for adaptive in &self.adaptive {
            if adaptive.name.is_empty() {
                return Err(ClassifiedError::validation("Adaptive limiter name cannot be empty"));
            }
            adaptive.settings.validate()?;
        }
        Ok(())
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            token_buckets: default_token_buckets(),
            adaptive: default_adaptive(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

/// One token-bucket limiter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBucketConfig {
    /// Registry name
    pub name: String,

    /// Calls allowed per window
    #[serde(default = "default_max_calls")]
    pub max_calls: u32,

    /// Window length (in seconds)
    #[serde(default = "default_time_window_secs")]
    pub time_window_secs: f64,

    /// Burst size; defaults to `max_calls`
    #[serde(default)]
    pub bucket_size: Option<u32>,
}

impl TokenBucketConfig {
    pub fn new(name: impl Into<String>, max_calls: u32, time_window_secs: f64) -> Self {
        Self {
            name: name.into(),
            max_calls,
            time_window_secs,
            bucket_size: None,
        }
    }

    /// Set an explicit burst size
    pub fn with_bucket_size(mut self, bucket_size: u32) -> Self {
        self.bucket_size = Some(bucket_size);
        self
    }

    pub fn time_window(&self) -> Duration {
        Duration::from_secs_f64(self.time_window_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ClassifiedError::validation("Token bucket name cannot be empty"));
        }
        if self.max_calls == 0 {
            return Err(ClassifiedError::validation(format!(
                "Token bucket '{}' max_calls must be > 0",
                self.name
            )));
        }
        if !self.time_window_secs.is_finite() || self.time_window_secs <= 0.0 {
            return Err(ClassifiedError::validation(format!(
                "Token bucket '{}' time_window_secs must be > 0",
                self.name
            )));
        }
        // Windows that round to zero or overflow a Duration are unusable.
        if !Duration::try_from_secs_f64(self.time_window_secs).is_ok_and(|w| !w.is_zero()) {
            return Err(ClassifiedError::validation(format!(
                "Token bucket '{}' time_window_secs ({}) is out of range",
                self.name, self.time_window_secs
            )));
        }
        if self.bucket_size == Some(0) {
            return Err(ClassifiedError::validation(format!(
                "Token bucket '{}' bucket_size must be > 0",
                self.name
            )));
        }
        Ok(())
    }
}

/// One adaptive limiter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveLimiterConfig {
    /// Registry name (conventionally ends in `_adaptive`)
    pub name: String,

    #[serde(flatten)]
    pub settings: AdaptiveSettings,
}

impl AdaptiveLimiterConfig {
    pub fn new(name: impl Into<String>, settings: AdaptiveSettings) -> Self {
        Self {
            name: name.into(),
            settings,
        }
    }
}

/// Defaults applied when constructing records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDefaults {
    /// TTL for records created without an explicit TTL (in seconds)
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl RecordDefaults {
    pub fn validate(&self) -> Result<()> {
        if self.ttl == 0 {
            return Err(ClassifiedError::validation("Default record TTL must be > 0"));
        }
        Ok(())
    }
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self { ttl: default_ttl() }
    }
}

/// Hosted-zone backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-process zones, lost on exit
    Memory {
        /// How long changes stay PENDING (in milliseconds)
        #[serde(default)]
        propagation_delay_ms: u64,
    },

    /// Zones persisted to a JSON file
    File {
        /// Path to the zone file
        path: PathBuf,
        /// How long changes stay PENDING (in milliseconds)
        #[serde(default)]
        propagation_delay_ms: u64,
    },
}

impl BackendConfig {
    pub fn propagation_delay(&self) -> Duration {
        match self {
            BackendConfig::Memory { propagation_delay_ms }
            | BackendConfig::File {
                propagation_delay_ms,
                ..
            } => Duration::from_millis(*propagation_delay_ms),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            BackendConfig::File { path, .. } if path.as_os_str().is_empty() => Err(
                ClassifiedError::validation("File backend path cannot be empty"),
            ),
            _ => Ok(()),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Memory {
            propagation_delay_ms: 0,
        }
    }
}

fn default_token_buckets() -> Vec<TokenBucketConfig> {
    vec![TokenBucketConfig::new(
        DEFAULT_LIMITER,
        default_max_calls(),
        default_time_window_secs(),
    )]
}

fn default_adaptive() -> Vec<AdaptiveLimiterConfig> {
    vec![AdaptiveLimiterConfig::new(
        format!("{}{}", DEFAULT_LIMITER, ADAPTIVE_SUFFIX),
        AdaptiveSettings::default(),
    )]
}

fn default_acquire_timeout_secs() -> f64 {
    30.0
}

fn default_max_calls() -> u32 {
    5
}

fn default_time_window_secs() -> f64 {
    1.0
}

fn default_ttl() -> u32 {
    300
}
