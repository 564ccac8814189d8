// # Memory Hosted Zones
//
// In-process implementation of HostedZoneApi.
//
// ## Purpose
//
// Simulates the hosted-zone service without network access: realistic
// error codes, prefixed ids and delayed propagation. Useful for tests, dry
// runs and local tooling.
//
// ## Crash Behavior
//
// - All zones are lost on exit
// - Use `FileHostedZones` when zones must survive restarts

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::classify::RemoteFailure;
use crate::traits::{ChangeBatch, ChangeInfo, HostedZone, HostedZoneApi, ResourceRecordSet};
use crate::zone::ZoneBook;

/// In-memory hosted-zone service
///
/// Clones share the same zones.
///
/// # Example
///
/// ```rust
/// use r53_core::traits::HostedZoneApi;
/// use r53_core::zone::MemoryHostedZones;
///
/// #[tokio::main]
/// async fn main() {
///     let api = MemoryHostedZones::new();
///     let zone = api.create_hosted_zone("example.com", "ref-1", None).await.unwrap();
///     assert!(zone.id.starts_with("/hostedzone/"));
///     assert_eq!(zone.record_set_count, 2);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryHostedZones {
    book: Arc<RwLock<ZoneBook>>,
    propagation_delay: Duration,
    injected: Arc<Mutex<VecDeque<RemoteFailure>>>,
    calls: Arc<AtomicU64>,
}

impl MemoryHostedZones {
    /// Create an empty service where changes are in sync immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep changes `PENDING` for `delay` after submission
    pub fn with_propagation_delay(delay: Duration) -> Self {
        Self {
            propagation_delay: delay,
            ..Self::default()
        }
    }

    /// Make the next call fail with `failure`
    ///
    /// Queued failures are consumed one per call, in order.
    pub fn fail_next(&self, failure: RemoteFailure) {
        self.injected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(failure);
    }

    /// Number of API calls received, including injected failures
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn propagation_delay(&self) -> Duration {
        self.propagation_delay
    }

    fn enter(&self) -> Result<(), RemoteFailure> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let injected = self
            .injected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match injected {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl HostedZoneApi for MemoryHostedZones {
    async fn change_resource_record_sets(
        &self,
        zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<ChangeInfo, RemoteFailure> {
        self.enter()?;
        let mut book = self.book.write().await;
        book.apply(zone_id, batch, chrono::Utc::now(), self.propagation_delay)
    }

    async fn list_resource_record_sets(
        &self,
        zone_id: &str,
    ) -> Result<Vec<ResourceRecordSet>, RemoteFailure> {
        self.enter()?;
        self.book.read().await.list_resource_record_sets(zone_id)
    }

    async fn get_change(&self, change_id: &str) -> Result<ChangeInfo, RemoteFailure> {
        self.enter()?;
        self.book.read().await.get_change(change_id, chrono::Utc::now())
    }

    async fn create_hosted_zone(
        &self,
        name: &str,
        caller_reference: &str,
        comment: Option<&str>,
    ) -> Result<HostedZone, RemoteFailure> {
        self.enter()?;
        self.book
            .write()
            .await
            .create_hosted_zone(name, caller_reference, comment)
    }

    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>, RemoteFailure> {
        self.enter()?;
        Ok(self.book.read().await.list_hosted_zones())
    }

    fn api_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{Change, ChangeAction, ChangeStatus};

    fn upsert(name: &str) -> ChangeBatch {
        ChangeBatch::new(vec![Change::new(
            ChangeAction::Upsert,
            ResourceRecordSet {
                name: name.to_string(),
                record_type: "A".to_string(),
                ttl: Some(300),
                values: vec!["192.0.2.10".to_string()],
                alias_target: None,
            },
        )])
    }

    #[tokio::test]
    async fn test_memory_zones_basic() {
        let api = MemoryHostedZones::new();

        // Initially empty
        assert!(api.list_hosted_zones().await.unwrap().is_empty());

        let zone = api.create_hosted_zone("example.com", "ref", Some("test")).await.unwrap();
        let info = api
            .change_resource_record_sets(&zone.id, &upsert("api.example.com."))
            .await
            .unwrap();
        assert_eq!(info.status, ChangeStatus::InSync);

        let records = api.list_resource_record_sets(&zone.id).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(api.call_count(), 4);
    }

    #[tokio::test]
    async fn test_clones_share_zones() {
        let api = MemoryHostedZones::new();
        let other = api.clone();
        api.create_hosted_zone("example.com", "ref", None).await.unwrap();
        assert_eq!(other.list_hosted_zones().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_propagation_delay() {
        let api = MemoryHostedZones::with_propagation_delay(Duration::from_secs(3600));
        let zone = api.create_hosted_zone("example.com", "ref", None).await.unwrap();
        let info = api
            .change_resource_record_sets(&zone.id, &upsert("www.example.com."))
            .await
            .unwrap();
        assert_eq!(info.status, ChangeStatus::Pending);
        let again = api.get_change(&info.id).await.unwrap();
        assert_eq!(again.status, ChangeStatus::Pending);
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let api = MemoryHostedZones::new();
        api.fail_next(RemoteFailure::service("Throttling", "Rate exceeded"));

        let err = api.list_hosted_zones().await.unwrap_err();
        assert_eq!(err, RemoteFailure::service("Throttling", "Rate exceeded"));
        assert!(api.list_hosted_zones().await.is_ok());
        assert_eq!(api.call_count(), 2);
    }
}
