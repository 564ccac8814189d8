// # Hosted-Zone API Trait
//
// Defines the remote surface the DNS operations talk to.
//
// ## Implementations
//
// - `zone::MemoryHostedZones`: in-process simulation
// - `zone::FileHostedZones`: the same simulation persisted to JSON
//
// ## Usage
//
// ```rust,ignore
// use r53_core::traits::{HostedZoneApi, ChangeBatch, Change, ChangeAction};
//
// let api = /* HostedZoneApi implementation */;
// let batch = ChangeBatch::new(vec![Change::new(ChangeAction::Upsert, record_set)]);
// let info = api.change_resource_record_sets("Z1234567890ABC", &batch).await?;
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::RemoteFailure;

/// What a change does to its record set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Create,
    Delete,
    Upsert,
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let action = match self {
            ChangeAction::Create => "CREATE",
            ChangeAction::Delete => "DELETE",
            ChangeAction::Upsert => "UPSERT",
        };
        f.write_str(action)
    }
}

/// Target of an alias record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTarget {
    pub hosted_zone_id: String,
    pub dns_name: String,
    #[serde(default)]
    pub evaluate_target_health: bool,
}

/// One record set as the API sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecordSet {
    /// Fully qualified name (ends in `.`)
    pub name: String,

    /// Record type, e.g. `A` or `TXT`
    #[serde(rename = "type")]
    pub record_type: String,

    /// Absent for alias records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_target: Option<AliasTarget>,
}

impl ResourceRecordSet {
    /// Identity of a record set within a zone: name plus type
    pub fn key(&self) -> (String, String) {
        (self.name.to_ascii_lowercase(), self.record_type.clone())
    }
}

/// A single change inside a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub action: ChangeAction,
    pub record_set: ResourceRecordSet,
}

impl Change {
    pub fn new(action: ChangeAction, record_set: ResourceRecordSet) -> Self {
        Self { action, record_set }
    }
}

/// A batch of changes applied atomically
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeBatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub changes: Vec<Change>,
}

impl ChangeBatch {
    pub fn new(changes: Vec<Change>) -> Self {
        Self {
            comment: None,
            changes,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Propagation state of a submitted change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "INSYNC")]
    InSync,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Pending => "PENDING",
            ChangeStatus::InSync => "INSYNC",
        }
    }
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted change as reported by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeInfo {
    /// Change id, including the `/change/` prefix
    pub id: String,
    pub status: ChangeStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A hosted zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZone {
    /// Zone id, including the `/hostedzone/` prefix
    pub id: String,
    /// Fully qualified zone name
    pub name: String,
    pub caller_reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub record_set_count: usize,
}

/// Trait for hosted-zone API implementations
///
/// Every method is one remote call. Implementations report failures as
/// [`RemoteFailure`] and leave classification, pacing and retries to the
/// caller.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait HostedZoneApi: Send + Sync {
    /// Apply a change batch to a zone
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Zone id without the `/hostedzone/` prefix
    /// - `batch`: The changes to apply atomically
    ///
    /// # Returns
    ///
    /// - `Ok(ChangeInfo)`: The submitted change, usually `PENDING`
    /// - `Err(RemoteFailure)`: `NoSuchHostedZone`, `InvalidChangeBatch`, ...
    async fn change_resource_record_sets(
        &self,
        zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<ChangeInfo, RemoteFailure>;

    /// List every record set in a zone
    async fn list_resource_record_sets(
        &self,
        zone_id: &str,
    ) -> Result<Vec<ResourceRecordSet>, RemoteFailure>;

    /// Look up a change by id (without the `/change/` prefix)
    async fn get_change(&self, change_id: &str) -> Result<ChangeInfo, RemoteFailure>;

    /// Create a hosted zone
    ///
    /// `caller_reference` must be unique per request.
    async fn create_hosted_zone(
        &self,
        name: &str,
        caller_reference: &str,
        comment: Option<&str>,
    ) -> Result<HostedZone, RemoteFailure>;

    /// List all hosted zones
    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>, RemoteFailure>;

    /// Short name used in logs
    fn api_name(&self) -> &'static str;
}
