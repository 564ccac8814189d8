// # DNS Operations
//
// High-level record and zone operations on top of a `HostedZoneApi`.
//
// ## Flow
//
// ```text
// inputs ──► validate ──► build request ──► ProtectedExecutor ──► api
//              │
//              └─► Validation error (no limiter accounting)
// ```
//
// Every operation issues exactly one protected call, except
// `wait_for_change`, which polls `get_change_status`.
//
// ## Pacing
//
// | Operation            | Pacing       |
// |----------------------|--------------|
// | create_dns_records   | adaptive     |
// | delete_dns_records   | adaptive     |
// | upsert_record        | adaptive     |
// | list_records         | token bucket |
// | get_change_status    | token bucket |
// | create_hosted_zone   | token bucket |
// | list_hosted_zones    | token bucket |

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DEFAULT_LIMITER;
use crate::error::{ClassifiedError, Result};
use crate::executor::{Pacing, ProtectedExecutor};
use crate::records::{DEFAULT_TTL, DnsRecord, RecordType};
use crate::traits::{
    Change, ChangeAction, ChangeBatch, ChangeInfo, ChangeStatus, HostedZone, HostedZoneApi,
    ResourceRecordSet,
};
use crate::validate::{normalize_change_id, normalize_domain, normalize_zone_id, validate_services};

/// Record and zone operations against one hosted-zone API
#[derive(Clone)]
pub struct DnsOperations {
    api: Arc<dyn HostedZoneApi>,
    executor: ProtectedExecutor,
    limiter_name: String,
    default_ttl: u32,
}

impl std::fmt::Debug for DnsOperations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsOperations")
            .field("api", &self.api.api_name())
            .field("limiter_name", &self.limiter_name)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl DnsOperations {
    /// Create operations paced by the default `route53` limiters
    pub fn new(api: Arc<dyn HostedZoneApi>, executor: ProtectedExecutor) -> Self {
        Self {
            api,
            executor,
            limiter_name: DEFAULT_LIMITER.to_string(),
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Use a different limiter name (and its `_adaptive` twin)
    pub fn with_limiter_name(mut self, limiter_name: impl Into<String>) -> Self {
        self.limiter_name = limiter_name.into();
        self
    }

    /// TTL for records created by `create_dns_records`
    pub fn with_default_ttl(mut self, ttl: u32) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn executor(&self) -> &ProtectedExecutor {
        &self.executor
    }

    /// UPSERT `{service}.{domain}` A records (AAAA for IPv6) pointing at `ip`
    pub async fn create_dns_records<S: AsRef<str>>(
        &self,
        zone_id: &str,
        domain: &str,
        ip: IpAddr,
        services: &[S],
    ) -> Result<ChangeInfo> {
        let zone_id = normalize_zone_id(zone_id)?;
        let domain = normalize_domain(domain)?;
        validate_services(services)?;

        let record_type = match ip {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        };
        let ip = ip.to_string();

        tracing::info!(
            "Creating {} DNS records in zone {} for {}",
            services.len(),
            zone_id,
            domain
        );

        let mut changes = Vec::with_capacity(services.len());
        for service in services {
            let hostname = normalize_domain(&format!("{}.{}", service.as_ref(), domain))?;
            let record = DnsRecord::new(record_type, hostname.clone(), &[ip.as_str()])?
                .with_ttl(self.default_ttl);
            tracing::debug!("Configuring DNS: {} -> {}", hostname, ip);
            changes.push(Change::new(ChangeAction::Upsert, record.to_record_set()));
        }
        let batch = ChangeBatch::new(changes);

        let info = self
            .executor
            .execute(&self.limiter_name, Pacing::Adaptive, || {
                self.api.change_resource_record_sets(&zone_id, &batch)
            })
            .await?;

        tracing::info!("Created DNS records (change {})", info.id);
        Ok(info)
    }

    /// List every record set in a zone
    pub async fn list_records(&self, zone_id: &str) -> Result<Vec<ResourceRecordSet>> {
        let zone_id = normalize_zone_id(zone_id)?;
        tracing::debug!("Listing records for hosted zone {}", zone_id);

        let records = self
            .executor
            .execute(&self.limiter_name, Pacing::TokenBucket, || {
                self.api.list_resource_record_sets(&zone_id)
            })
            .await?;

        tracing::info!("Found {} records in zone {}", records.len(), zone_id);
        Ok(records)
    }

    /// DELETE the `{service}.{domain}` A records
    pub async fn delete_dns_records<S: AsRef<str>>(
        &self,
        zone_id: &str,
        domain: &str,
        services: &[S],
    ) -> Result<ChangeInfo> {
        let zone_id = normalize_zone_id(zone_id)?;
        let domain = normalize_domain(domain)?;
        validate_services(services)?;

        let mut changes = Vec::with_capacity(services.len());
        for service in services {
            let hostname = normalize_domain(&format!("{}.{}", service.as_ref(), domain))?;
            tracing::debug!("Deleting DNS: {}", hostname);
            changes.push(Change::new(
                ChangeAction::Delete,
                ResourceRecordSet {
                    name: hostname,
                    record_type: RecordType::A.as_str().to_string(),
                    ttl: None,
                    values: Vec::new(),
                    alias_target: None,
                },
            ));
        }
        let batch = ChangeBatch::new(changes);

        let info = self
            .executor
            .execute(&self.limiter_name, Pacing::Adaptive, || {
                self.api.change_resource_record_sets(&zone_id, &batch)
            })
            .await?;

        tracing::info!("Deleted DNS records (change {})", info.id);
        Ok(info)
    }

    /// UPSERT one constructed record
    pub async fn upsert_record(&self, zone_id: &str, record: &DnsRecord) -> Result<ChangeInfo> {
        let zone_id = normalize_zone_id(zone_id)?;
        let mut record_set = record.to_record_set();
        record_set.name = normalize_domain(&record_set.name)?;

        tracing::info!(
            "Upserting {} record {} in zone {}",
            record.record_type(),
            record_set.name,
            zone_id
        );
        let batch = ChangeBatch::new(vec![Change::new(ChangeAction::Upsert, record_set)]);

        let info = self
            .executor
            .execute(&self.limiter_name, Pacing::Adaptive, || {
                self.api.change_resource_record_sets(&zone_id, &batch)
            })
            .await?;

        tracing::info!("Updated record (change {})", info.id);
        Ok(info)
    }

    /// Current propagation status of a change
    pub async fn get_change_status(&self, change_id: &str) -> Result<ChangeStatus> {
        let change_id = normalize_change_id(change_id)?;
        tracing::debug!("Checking status for change {}", change_id);

        let info = self
            .executor
            .execute(&self.limiter_name, Pacing::TokenBucket, || {
                self.api.get_change(&change_id)
            })
            .await?;

        tracing::debug!("Change {} status: {}", change_id, info.status);
        Ok(info.status)
    }

    /// Poll until a change is `INSYNC`
    ///
    /// Fails with `Timeout` once `timeout` has elapsed without the change
    /// reaching `INSYNC`. Errors from the status check end the wait.
    pub async fn wait_for_change(
        &self,
        change_id: &str,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<()> {
        let change_id = normalize_change_id(change_id)?;
        // Unrepresentable deadlines mean no deadline.
        let deadline = tokio::time::Instant::now().checked_add(timeout);

        loop {
            if self.get_change_status(&change_id).await? == ChangeStatus::InSync {
                tracing::info!("Change {} is in sync", change_id);
                return Ok(());
            }

            let mut sleep_for = poll_interval;
            if let Some(deadline) = deadline {
                let now = tokio::time::Instant::now();
                if now >= deadline {
                    return Err(ClassifiedError::timeout(format!(
                        "Change {} not in sync after {:?}",
                        change_id, timeout
                    )));
                }
                sleep_for = sleep_for.min(deadline - now);
            }
            tokio::time::sleep(sleep_for).await;
        }
    }

    /// Create a hosted zone for `domain`
    pub async fn create_hosted_zone(&self, domain: &str, comment: Option<&str>) -> Result<HostedZone> {
        let domain = normalize_domain(domain)?;
        let caller_reference = format!(
            "{}-{}",
            domain.trim_end_matches('.'),
            chrono::Utc::now().timestamp_micros()
        );
        tracing::info!("Creating hosted zone for {}", domain);

        let zone = self
            .executor
            .execute(&self.limiter_name, Pacing::TokenBucket, || {
                self.api.create_hosted_zone(&domain, &caller_reference, comment)
            })
            .await?;

        tracing::info!("Created hosted zone {} ({})", zone.name, zone.id);
        Ok(zone)
    }

    /// List all hosted zones
    pub async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>> {
        self.executor
            .execute(&self.limiter_name, Pacing::TokenBucket, || {
                self.api.list_hosted_zones()
            })
            .await
    }
}
