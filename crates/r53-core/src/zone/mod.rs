// # Hosted-Zone Backends
//
// Implementations of HostedZoneApi that simulate the remote service,
// plus the selector that builds one from configuration.

pub mod book;
pub mod file;
pub mod memory;

use std::sync::Arc;

pub use book::ZoneBook;
pub use file::FileHostedZones;
pub use memory::MemoryHostedZones;

use crate::config::BackendConfig;
use crate::error::Result;
use crate::traits::HostedZoneApi;

/// Build the backend described by `config`
pub async fn open_backend(config: &BackendConfig) -> Result<Arc<dyn HostedZoneApi>> {
    config.validate()?;
    let delay = config.propagation_delay();

    let api: Arc<dyn HostedZoneApi> = match config {
        BackendConfig::Memory { .. } => Arc::new(MemoryHostedZones::with_propagation_delay(delay)),
        BackendConfig::File { path, .. } => Arc::new(FileHostedZones::open(path, delay).await?),
    };
    tracing::debug!("Using {} hosted-zone backend", api.api_name());
    Ok(api)
}
