//! Test doubles and common utilities for contract tests
//!
//! This module provides a scripted hosted-zone API that counts calls and
//! returns queued outcomes, plus fixtures wired with the default limiters.

#![allow(dead_code)]

use chrono::Utc;
use r53_core::classify::RemoteFailure;
use r53_core::traits::{
    ChangeBatch, ChangeInfo, ChangeStatus, HostedZone, HostedZoneApi, ResourceRecordSet,
};
use r53_core::{DnsOperations, LimiterRegistry, MemoryHostedZones, ProtectedExecutor};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Zone id accepted by the validator
pub const ZONE_ID: &str = "Z1234567890ABC";

/// A HostedZoneApi whose change calls return scripted outcomes
///
/// Unscripted calls succeed with an `INSYNC` change.
#[derive(Default)]
pub struct ScriptedApi {
    outcomes: Mutex<VecDeque<Result<ChangeStatus, RemoteFailure>>>,
    change_calls: AtomicUsize,
    list_calls: AtomicUsize,
    get_change_calls: AtomicUsize,
    last_batch: Mutex<Option<ChangeBatch>>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the outcome of the next `change_resource_record_sets` or `get_change`
    pub fn push(&self, outcome: Result<ChangeStatus, RemoteFailure>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn change_calls(&self) -> usize {
        self.change_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_change_calls(&self) -> usize {
        self.get_change_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.change_calls() + self.list_calls() + self.get_change_calls()
    }

    pub fn last_batch(&self) -> Option<ChangeBatch> {
        self.last_batch.lock().unwrap().clone()
    }

    fn next_change(&self, id: &str) -> Result<ChangeInfo, RemoteFailure> {
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ChangeStatus::InSync));
        outcome.map(|status| ChangeInfo {
            id: format!("/change/{}", id),
            status,
            submitted_at: Utc::now(),
            comment: None,
        })
    }
}

#[async_trait::async_trait]
impl HostedZoneApi for ScriptedApi {
    async fn change_resource_record_sets(
        &self,
        _zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<ChangeInfo, RemoteFailure> {
        let n = self.change_calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_batch.lock().unwrap() = Some(batch.clone());
        self.next_change(&format!("C{:08}", n))
    }

    async fn list_resource_record_sets(
        &self,
        _zone_id: &str,
    ) -> Result<Vec<ResourceRecordSet>, RemoteFailure> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn get_change(&self, change_id: &str) -> Result<ChangeInfo, RemoteFailure> {
        self.get_change_calls.fetch_add(1, Ordering::SeqCst);
        self.next_change(change_id)
    }

    async fn create_hosted_zone(
        &self,
        name: &str,
        caller_reference: &str,
        comment: Option<&str>,
    ) -> Result<HostedZone, RemoteFailure> {
        Ok(HostedZone {
            id: format!("/hostedzone/{}", ZONE_ID),
            name: name.to_string(),
            caller_reference: caller_reference.to_string(),
            comment: comment.map(str::to_string),
            record_set_count: 2,
        })
    }

    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>, RemoteFailure> {
        Ok(Vec::new())
    }

    fn api_name(&self) -> &'static str {
        "scripted"
    }
}

/// Executor over the default `route53` limiters
pub fn default_executor() -> ProtectedExecutor {
    ProtectedExecutor::new(Arc::new(LimiterRegistry::with_defaults()))
}

/// Operations over a scripted API
pub fn scripted_operations() -> (Arc<ScriptedApi>, DnsOperations) {
    let api = ScriptedApi::new();
    let ops = DnsOperations::new(api.clone(), default_executor());
    (api, ops)
}

/// Operations over an in-memory service with one zone for `example.com`
pub async fn memory_operations() -> (MemoryHostedZones, DnsOperations, String) {
    let api = MemoryHostedZones::new();
    let ops = DnsOperations::new(Arc::new(api.clone()), default_executor());
    let zone = ops.create_hosted_zone("example.com", None).await.unwrap();
    (api, ops, zone.id)
}
