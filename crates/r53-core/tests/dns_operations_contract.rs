//! Contract Test: DNS Operations
//!
//! Verifies the operation layer on top of the executor:
//! - Invalid input is rejected before any limiter or API call
//! - Each operation issues exactly one API call
//! - Remote failures surface as classified errors with their codes
//! - Record batches have the expected shape

mod common;

use common::*;
use r53_core::classify::RemoteFailure;
use r53_core::traits::{ChangeAction, ChangeStatus};
use r53_core::{DnsRecord, ErrorKind, RecordType};
use std::net::IpAddr;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn invalid_input_never_reaches_limiter_or_api() {
    let (api, ops) = scripted_operations();
    let registry = ops.executor().registry().clone();
    let bucket = registry.get("route53").unwrap();
    let bucket = bucket.as_token_bucket().unwrap().clone();
    let adaptive = registry.get("route53_adaptive").unwrap();
    let adaptive = adaptive.as_adaptive().unwrap().clone();
    let ip: IpAddr = "10.0.0.1".parse().unwrap();

    let errors = vec![
        ops.list_records("bad!zone").await.unwrap_err(),
        ops.list_records("").await.unwrap_err(),
        ops.create_dns_records(ZONE_ID, "example.com", ip, &[] as &[&str])
            .await
            .unwrap_err(),
        ops.create_dns_records(ZONE_ID, "", ip, &["api"]).await.unwrap_err(),
        ops.delete_dns_records("Z1", "example.com", &["api"]).await.unwrap_err(),
        ops.get_change_status("").await.unwrap_err(),
        ops.get_change_status("/change/").await.unwrap_err(),
        ops.create_hosted_zone(&"a".repeat(254), None).await.unwrap_err(),
    ];

    for err in errors {
        assert_eq!(err.kind(), ErrorKind::Validation, "{}", err);
    }

    assert_eq!(api.total_calls(), 0);
    assert_eq!(bucket.available(), 5.0);
    assert_eq!(adaptive.snapshot().consecutive_successes, 0);
    assert_eq!(adaptive.snapshot().consecutive_failures, 0);
    assert_eq!(adaptive.current_rate(), 2.0);
}

#[tokio::test(start_paused = true)]
async fn create_records_builds_one_upsert_batch() {
    let (api, ops) = scripted_operations();
    let ip: IpAddr = "10.0.0.1".parse().unwrap();

    let info = ops
        .create_dns_records(
            "/hostedzone/Z1234567890ABC",
            "example.com",
            ip,
            &["api", "web"],
        )
        .await
        .unwrap();
    assert!(info.id.starts_with("/change/"));
    assert_eq!(api.change_calls(), 1);

    let batch = api.last_batch().unwrap();
    assert_eq!(batch.changes.len(), 2);
    let names: Vec<&str> = batch.changes.iter().map(|c| c.record_set.name.as_str()).collect();
    assert_eq!(names, vec!["api.example.com.", "web.example.com."]);
    for change in &batch.changes {
        assert_eq!(change.action, ChangeAction::Upsert);
        assert_eq!(change.record_set.record_type, "A");
        assert_eq!(change.record_set.ttl, Some(300));
        assert_eq!(change.record_set.values, vec!["10.0.0.1"]);
    }
}

#[tokio::test(start_paused = true)]
async fn ipv6_address_creates_aaaa_records() {
    let (api, ops) = scripted_operations();
    let ip: IpAddr = "2001:db8::1".parse().unwrap();

    ops.create_dns_records(ZONE_ID, "example.com.", ip, &["api"])
        .await
        .unwrap();

    let batch = api.last_batch().unwrap();
    assert_eq!(batch.changes[0].record_set.record_type, "AAAA");
    assert_eq!(batch.changes[0].record_set.name, "api.example.com.");
}

#[tokio::test(start_paused = true)]
async fn remote_failure_is_classified_and_not_retried() {
    let (api, ops) = scripted_operations();
    api.push(Err(RemoteFailure::service(
        "AccessDenied",
        "User is not authorized to perform route53:ChangeResourceRecordSets",
    )));

    let err = ops
        .delete_dns_records(ZONE_ID, "example.com", &["api"])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert_eq!(err.remote_code(), "AccessDenied");
    assert!(err.message().contains("not authorized"));
    assert_eq!(api.change_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn change_status_strips_prefix() {
    let (api, ops) = scripted_operations();
    api.push(Ok(ChangeStatus::Pending));

    let status = ops.get_change_status("/change/C2682N5HXP0BZ4").await.unwrap();
    assert_eq!(status, ChangeStatus::Pending);
    assert_eq!(api.get_change_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn wait_for_change_polls_until_in_sync() {
    let (api, ops) = scripted_operations();
    api.push(Ok(ChangeStatus::Pending));
    api.push(Ok(ChangeStatus::Pending));
    api.push(Ok(ChangeStatus::InSync));

    ops.wait_for_change("C123", Duration::from_secs(1), Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(api.get_change_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn wait_for_change_times_out() {
    let (api, ops) = scripted_operations();
    for _ in 0..100 {
        api.push(Ok(ChangeStatus::Pending));
    }

    let err = ops
        .wait_for_change("C123", Duration::from_secs(2), Duration::from_secs(5))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(api.get_change_calls() >= 3);
}

#[tokio::test(start_paused = true)]
async fn wait_for_change_accepts_unbounded_timeout() {
    let (api, ops) = scripted_operations();
    api.push(Ok(ChangeStatus::Pending));
    api.push(Ok(ChangeStatus::InSync));

    ops.wait_for_change("C123", Duration::from_secs(1), Duration::MAX)
        .await
        .unwrap();
    assert_eq!(api.get_change_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn overlong_service_hostname_is_rejected_locally() {
    let (api, ops) = scripted_operations();
    let label = "a".repeat(63);
    // 250 characters: fits on its own, not with a service prefix
    let domain = format!("{label}.{label}.{label}.{}", "b".repeat(58));
    assert_eq!(domain.len(), 250);
    let ip: IpAddr = "10.0.0.1".parse().unwrap();

    let created = ops
        .create_dns_records(ZONE_ID, &domain, ip, &["api"])
        .await
        .unwrap_err();
    let deleted = ops
        .delete_dns_records(ZONE_ID, &domain, &["api"])
        .await
        .unwrap_err();

    assert_eq!(created.kind(), ErrorKind::Validation);
    assert_eq!(deleted.kind(), ErrorKind::Validation);
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn records_round_trip_through_memory_service() {
    let (api, ops, zone_id) = memory_operations().await;
    let ip: IpAddr = "192.0.2.10".parse().unwrap();

    let info = ops
        .create_dns_records(&zone_id, "example.com", ip, &["api", "web"])
        .await
        .unwrap();
    assert_eq!(ops.get_change_status(&info.id).await.unwrap(), ChangeStatus::InSync);

    let records = ops.list_records(&zone_id).await.unwrap();
    assert_eq!(records.len(), 4);

    let txt = DnsRecord::new(RecordType::Txt, "example.com", &["v=spf1 -all"]).unwrap();
    ops.upsert_record(&zone_id, &txt).await.unwrap();
    let records = ops.list_records(&zone_id).await.unwrap();
    let stored = records.iter().find(|r| r.record_type == "TXT").unwrap();
    assert_eq!(stored.name, "example.com.");
    assert_eq!(stored.values, vec!["\"v=spf1 -all\""]);

    ops.delete_dns_records(&zone_id, "example.com", &["web"])
        .await
        .unwrap();
    let records = ops.list_records(&zone_id).await.unwrap();
    assert!(records.iter().all(|r| r.name != "web.example.com."));
    assert!(records.iter().any(|r| r.name == "api.example.com."));

    // Create zone + create + status + list + upsert + list + delete + list
    assert_eq!(api.call_count(), 8);
}

#[tokio::test(start_paused = true)]
async fn memory_service_errors_are_classified() {
    let (api, ops, zone_id) = memory_operations().await;

    let err = ops.list_records("ZDOESNOTEXIST1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.remote_code(), "NoSuchHostedZone");

    let err = ops
        .delete_dns_records(&zone_id, "example.com", &["missing"])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.remote_code(), "InvalidChangeBatch");

    let err = ops.get_change_status("CUNKNOWN").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    api.fail_next(RemoteFailure::service("PriorRequestNotComplete", "busy"));
    let err = ops.list_hosted_zones().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Throttled);
    assert_eq!(ops.list_hosted_zones().await.unwrap().len(), 1);
}
