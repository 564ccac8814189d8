// # r53-core
//
// Core library for hosted-zone record automation.
//
// ## Architecture Overview
//
// Every remote call goes through one protected path:
// - **Validator**: Rejects malformed zone ids, domains and change ids before
//   any limiter is touched
// - **LimiterRegistry**: Named token-bucket and adaptive limiters
// - **ProtectedExecutor**: Acquires capacity, runs the call once, classifies
//   the failure and feeds the outcome back to adaptive limiters
// - **Classifier**: Maps remote error codes onto a closed `ErrorKind`
// - **DnsOperations**: Record and zone operations built on the above
// - **HostedZoneApi**: The remote service, with memory and file backends
//
// ## Design Principles
//
// 1. **Explicit state**: Limiters live in a registry object, never a global
// 2. **Fail open**: A missing limiter degrades to an unthrottled call
// 3. **No hidden retries**: Callers decide from `ErrorKind` alone
// 4. **Library-First**: `r53ctl` is a thin shell over this crate

pub mod classify;
pub mod config;
pub mod error;
pub mod executor;
pub mod limiter;
pub mod operations;
pub mod records;
pub mod registry;
pub mod traits;
pub mod validate;
pub mod zone;

// Re-export core types for convenience
pub use classify::{RemoteFailure, classify};
pub use config::{AutomationConfig, BackendConfig, LimitsConfig};
pub use error::{ClassifiedError, ErrorKind, Result};
pub use executor::{Pacing, ProtectedExecutor};
pub use limiter::{AdaptiveLimiter, AdaptiveSettings, TokenBucket};
pub use operations::DnsOperations;
pub use records::{DnsRecord, RecordType};
pub use registry::LimiterRegistry;
pub use traits::HostedZoneApi;
pub use zone::{FileHostedZones, MemoryHostedZones};
