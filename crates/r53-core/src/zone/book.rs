// # Zone Book
//
// The serializable state behind both zone backends: hosted zones, their
// record sets and submitted changes. All service rules live here so the
// memory and file backends behave identically.
//
// ## Rules
//
// - Zone ids look like `Z0000000000001`; the API shows them as
//   `/hostedzone/Z0000000000001`.
// - A change batch is all-or-nothing. Every change is checked against a
//   scratch copy before the zone is touched.
// - A change is `PENDING` until its propagation delay has passed.
// - A new zone starts with its NS and SOA record sets.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::RemoteFailure;
use crate::traits::{
    ChangeAction, ChangeBatch, ChangeInfo, ChangeStatus, HostedZone, ResourceRecordSet,
};
use crate::validate::{CHANGE_PREFIX, HOSTED_ZONE_PREFIX};

const NAME_SERVERS: [&str; 4] = [
    "ns-1.awsdns-00.com.",
    "ns-2.awsdns-00.net.",
    "ns-3.awsdns-00.org.",
    "ns-4.awsdns-00.co.uk.",
];

const SOA_VALUE: &str =
    "ns-1.awsdns-00.com. awsdns-hostmaster.amazon.com. 1 7200 900 1209600 86400";

const ZONE_TTL: u32 = 172_800;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ZoneEntry {
    name: String,
    caller_reference: String,
    #[serde(default)]
    comment: Option<String>,
    records: Vec<ResourceRecordSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChangeEntry {
    submitted_at: DateTime<Utc>,
    in_sync_at: DateTime<Utc>,
    #[serde(default)]
    comment: Option<String>,
}

/// Zones, records and changes of one simulated account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneBook {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    zones: BTreeMap<String, ZoneEntry>,
    #[serde(default)]
    changes: BTreeMap<String, ChangeEntry>,
}

impl ZoneBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of hosted zones
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    fn allocate(&mut self, prefix: char) -> String {
        self.next_id += 1;
        format!("{}{:013X}", prefix, self.next_id)
    }

    pub fn create_hosted_zone(
        &mut self,
        name: &str,
        caller_reference: &str,
        comment: Option<&str>,
    ) -> Result<HostedZone, RemoteFailure> {
        let name = name.trim();
        if name.is_empty() || name == "." {
            return Err(RemoteFailure::service(
                "InvalidDomainName",
                "Domain name cannot be empty",
            ));
        }
        if caller_reference.is_empty() {
            return Err(RemoteFailure::service(
                "InvalidInput",
                "CallerReference cannot be empty",
            ));
        }
        if self
            .zones
            .values()
            .any(|zone| zone.caller_reference == caller_reference)
        {
            return Err(RemoteFailure::service(
                "HostedZoneAlreadyExists",
                format!(
                    "A hosted zone has already been created with the specified caller reference: {}",
                    caller_reference
                ),
            ));
        }

        let name = if name.ends_with('.') {
            name.to_ascii_lowercase()
        } else {
            format!("{}.", name.to_ascii_lowercase())
        };

        let records = vec![
            ResourceRecordSet {
                name: name.clone(),
                record_type: "NS".to_string(),
                ttl: Some(ZONE_TTL),
                values: NAME_SERVERS.iter().map(|ns| ns.to_string()).collect(),
                alias_target: None,
            },
            ResourceRecordSet {
                name: name.clone(),
                record_type: "SOA".to_string(),
                ttl: Some(900),
                values: vec![SOA_VALUE.to_string()],
                alias_target: None,
            },
        ];

        let id = self.allocate('Z');
        let entry = ZoneEntry {
            name,
            caller_reference: caller_reference.to_string(),
            comment: comment.map(str::to_string),
            records,
        };
        let zone = Self::describe(&id, &entry);
        self.zones.insert(id, entry);
        Ok(zone)
    }

    pub fn list_hosted_zones(&self) -> Vec<HostedZone> {
        self.zones
            .iter()
            .map(|(id, entry)| Self::describe(id, entry))
            .collect()
    }

    pub fn list_resource_record_sets(
        &self,
        zone_id: &str,
    ) -> Result<Vec<ResourceRecordSet>, RemoteFailure> {
        Ok(self.zone(zone_id)?.records.clone())
    }

    /// Apply a batch atomically and record the change
    pub fn apply(
        &mut self,
        zone_id: &str,
        batch: &ChangeBatch,
        now: DateTime<Utc>,
        propagation_delay: Duration,
    ) -> Result<ChangeInfo, RemoteFailure> {
        let zone = self.zone(zone_id)?;

        if batch.changes.is_empty() {
            return Err(RemoteFailure::service(
                "InvalidInput",
                "ChangeBatch must contain at least one change",
            ));
        }

        let mut records = zone.records.clone();
        for change in &batch.changes {
            Self::apply_one(&zone.name, &mut records, change.action, &change.record_set)?;
        }

        let id = self.allocate('C');
        let zone = self.zone_mut(zone_id)?;
        zone.records = records;

        let entry = ChangeEntry {
            submitted_at: now,
            in_sync_at: in_sync_at(now, propagation_delay),
            comment: batch.comment.clone(),
        };
        let info = Self::change_info(&id, &entry, now);
        self.changes.insert(id, entry);
        Ok(info)
    }

    pub fn get_change(&self, change_id: &str, now: DateTime<Utc>) -> Result<ChangeInfo, RemoteFailure> {
        let id = change_id.strip_prefix(CHANGE_PREFIX).unwrap_or(change_id);
        self.changes
            .get(id)
            .map(|entry| Self::change_info(id, entry, now))
            .ok_or_else(|| {
                RemoteFailure::service(
                    "NoSuchChange",
                    format!("A change with the specified change ID does not exist: {}", id),
                )
            })
    }

    fn apply_one(
        zone_name: &str,
        records: &mut Vec<ResourceRecordSet>,
        action: ChangeAction,
        record_set: &ResourceRecordSet,
    ) -> Result<(), RemoteFailure> {
        let name = record_set.name.to_ascii_lowercase();
        let in_zone = name == zone_name || name.ends_with(&format!(".{}", zone_name));
        if !in_zone {
            return Err(RemoteFailure::service(
                "InvalidChangeBatch",
                format!(
                    "RRSet with DNS name {} is not permitted in zone {}",
                    record_set.name, zone_name
                ),
            ));
        }

        let key = record_set.key();
        let existing = records.iter().position(|r| r.key() == key);

        match action {
            ChangeAction::Create | ChangeAction::Upsert => {
                if record_set.values.is_empty() && record_set.alias_target.is_none() {
                    return Err(RemoteFailure::service(
                        "InvalidInput",
                        format!(
                            "Record set {} {} has neither values nor an alias target",
                            record_set.name, record_set.record_type
                        ),
                    ));
                }
                match (action, existing) {
                    (ChangeAction::Create, Some(_)) => Err(RemoteFailure::service(
                        "InvalidChangeBatch",
                        format!(
                            "Tried to create resource record set [name='{}', type='{}'] but it already exists",
                            record_set.name, record_set.record_type
                        ),
                    )),
                    (_, Some(index)) => {
                        records[index] = record_set.clone();
                        Ok(())
                    }
                    (_, None) => {
                        records.push(record_set.clone());
                        Ok(())
                    }
                }
            }
            ChangeAction::Delete => {
                let Some(index) = existing else {
                    return Err(RemoteFailure::service(
                        "InvalidChangeBatch",
                        format!(
                            "Tried to delete resource record set [name='{}', type='{}'] but it was not found",
                            record_set.name, record_set.record_type
                        ),
                    ));
                };

                // A delete that names values must match them.
                let current = &records[index];
                let mismatched = (!record_set.values.is_empty() && record_set.values != current.values)
                    || (record_set.ttl.is_some() && record_set.ttl != current.ttl);
                if mismatched {
                    return Err(RemoteFailure::service(
                        "InvalidChangeBatch",
                        format!(
                            "Tried to delete resource record set [name='{}', type='{}'] but the values provided do not match the current values",
                            record_set.name, record_set.record_type
                        ),
                    ));
                }

                records.remove(index);
                Ok(())
            }
        }
    }

    fn zone(&self, zone_id: &str) -> Result<&ZoneEntry, RemoteFailure> {
        let id = zone_id.strip_prefix(HOSTED_ZONE_PREFIX).unwrap_or(zone_id);
        self.zones.get(id).ok_or_else(|| no_such_zone(id))
    }

    fn zone_mut(&mut self, zone_id: &str) -> Result<&mut ZoneEntry, RemoteFailure> {
        let id = zone_id.strip_prefix(HOSTED_ZONE_PREFIX).unwrap_or(zone_id);
        self.zones.get_mut(id).ok_or_else(|| no_such_zone(id))
    }

    fn describe(id: &str, entry: &ZoneEntry) -> HostedZone {
        HostedZone {
            id: format!("{}{}", HOSTED_ZONE_PREFIX, id),
            name: entry.name.clone(),
            caller_reference: entry.caller_reference.clone(),
            comment: entry.comment.clone(),
            record_set_count: entry.records.len(),
        }
    }

    fn change_info(id: &str, entry: &ChangeEntry, now: DateTime<Utc>) -> ChangeInfo {
        let status = if now >= entry.in_sync_at {
            ChangeStatus::InSync
        } else {
            ChangeStatus::Pending
        };
        ChangeInfo {
            id: format!("{}{}", CHANGE_PREFIX, id),
            status,
            submitted_at: entry.submitted_at,
            comment: entry.comment.clone(),
        }
    }
}

fn no_such_zone(id: &str) -> RemoteFailure {
    RemoteFailure::service(
        "NoSuchHostedZone",
        format!("No hosted zone found with ID: {}", id),
    )
}

fn in_sync_at(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|delay| now.checked_add_signed(delay))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
