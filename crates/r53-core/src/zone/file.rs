// # File Hosted Zones
//
// File-backed implementation of HostedZoneApi with crash recovery.
//
// ## Purpose
//
// Keeps simulated zones across runs of `r53ctl`, so a change submitted by
// one invocation can be checked by the next.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good state
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "book": {
//     "next_id": 2,
//     "zones": { "Z0000000000001": { "name": "example.com.", ... } },
//     "changes": { "C0000000000002": { "submitted_at": "...", ... } }
//   }
// }
// ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::classify::RemoteFailure;
use crate::error::{ClassifiedError, Result};
use crate::traits::{ChangeBatch, ChangeInfo, HostedZone, HostedZoneApi, ResourceRecordSet};
use crate::zone::ZoneBook;

/// Zone file format version
const ZONE_FILE_VERSION: &str = "1.0";

/// File-backed hosted-zone service
///
/// Every mutating call rewrites the file before returning.
///
/// # Example
///
/// ```rust,no_run
/// use r53_core::traits::HostedZoneApi;
/// use r53_core::zone::FileHostedZones;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let api = FileHostedZones::open("/var/lib/r53/zones.json", Duration::ZERO).await?;
///     let zones = api.list_hosted_zones().await.map_err(|e| format!("{e:?}"))?;
///     println!("{} zones", zones.len());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileHostedZones {
    path: PathBuf,
    book: RwLock<ZoneBook>,
    propagation_delay: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
struct ZoneFileFormat {
    version: String,
    book: ZoneBook,
}

impl FileHostedZones {
    /// Open or create a zone file
    ///
    /// 1. Load the existing file
    /// 2. If it is corrupt, load the backup and restore it
    /// 3. If both fail, start empty
    /// 4. Create parent directories if needed
    pub async fn open(path: impl AsRef<Path>, propagation_delay: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                ClassifiedError::generic(format!(
                    "Failed to create zone directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let book = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            book: RwLock::new(book),
            propagation_delay,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_with_recovery(path: &Path) -> Result<ZoneBook> {
        let Some(content) = Self::read(path).await? else {
            tracing::debug!("Zone file does not exist: {}", path.display());
            return Ok(ZoneBook::new());
        };

        match Self::parse(path, &content) {
            Ok(book) => {
                tracing::debug!("Loaded {} hosted zones from {}", book.zone_count(), path.display());
                Ok(book)
            }
            Err(e) => {
                tracing::warn!(
                    "Zone file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                let backup = match Self::read(&backup_path).await? {
                    Some(content) => Self::parse(&backup_path, &content),
                    None => {
                        tracing::warn!("No backup file found. Starting with empty zones.");
                        return Ok(ZoneBook::new());
                    }
                };

                match backup {
                    Ok(book) => {
                        tracing::info!("Recovered {} hosted zones from backup", book.zone_count());
                        if let Err(restore_err) = fs::copy(&backup_path, path).await {
                            tracing::error!(
                                "Failed to restore zone file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(book)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also corrupted: {}. Starting with empty zones.",
                            backup_err
                        );
                        Ok(ZoneBook::new())
                    }
                }
            }
        }
    }

    async fn read(path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClassifiedError::generic(format!(
                "Failed to read zone file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn parse(path: &Path, content: &str) -> Result<ZoneBook> {
        let file: ZoneFileFormat = serde_json::from_str(content).map_err(|e| {
            ClassifiedError::generic(format!(
                "Failed to parse zone file {}: {}",
                path.display(),
                e
            ))
        })?;

        if file.version != ZONE_FILE_VERSION {
            tracing::warn!(
                "Zone file version mismatch: expected {}, got {}. Attempting to load anyway.",
                ZONE_FILE_VERSION,
                file.version
            );
        }
        Ok(file.book)
    }

    /// Write the book to disk atomically
    async fn write(&self, book: &ZoneBook) -> Result<()> {
        let file = ZoneFileFormat {
            version: ZONE_FILE_VERSION.to_string(),
            book: book.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let temp_path = self.temp_path();
        {
            let mut temp = fs::File::create(&temp_path).await.map_err(|e| {
                ClassifiedError::generic(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            temp.write_all(json.as_bytes()).await?;
            temp.flush().await?;
        }

        if self.path.exists()
            && let Err(e) = fs::copy(&self.path, Self::backup_path(&self.path)).await
        {
            tracing::warn!("Failed to create backup: {}", e);
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            ClassifiedError::generic(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Zones written to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl HostedZoneApi for FileHostedZones {
    async fn change_resource_record_sets(
        &self,
        zone_id: &str,
        batch: &ChangeBatch,
    ) -> std::result::Result<ChangeInfo, RemoteFailure> {
        let mut book = self.book.write().await;
        let mut next = book.clone();
        let info = next.apply(zone_id, batch, chrono::Utc::now(), self.propagation_delay)?;

        // Only commit in memory once the file holds the new state.
        self.write(&next).await?;
        *book = next;
        Ok(info)
    }

    async fn list_resource_record_sets(
        &self,
        zone_id: &str,
    ) -> std::result::Result<Vec<ResourceRecordSet>, RemoteFailure> {
        self.book.read().await.list_resource_record_sets(zone_id)
    }

    async fn get_change(&self, change_id: &str) -> std::result::Result<ChangeInfo, RemoteFailure> {
        self.book.read().await.get_change(change_id, chrono::Utc::now())
    }

    async fn create_hosted_zone(
        &self,
        name: &str,
        caller_reference: &str,
        comment: Option<&str>,
    ) -> std::result::Result<HostedZone, RemoteFailure> {
        let mut book = self.book.write().await;
        let mut next = book.clone();
        let zone = next.create_hosted_zone(name, caller_reference, comment)?;

        self.write(&next).await?;
        *book = next;
        Ok(zone)
    }

    async fn list_hosted_zones(&self) -> std::result::Result<Vec<HostedZone>, RemoteFailure> {
        Ok(self.book.read().await.list_hosted_zones())
    }

    fn api_name(&self) -> &'static str {
        "file"
    }
}
