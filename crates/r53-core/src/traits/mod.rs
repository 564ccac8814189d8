//! Core traits for hosted-zone automation
//!
//! - [`HostedZoneApi`]: The remote hosted-zone service

pub mod hosted_zone;

pub use hosted_zone::{
    AliasTarget, Change, ChangeAction, ChangeBatch, ChangeInfo, ChangeStatus, HostedZone,
    HostedZoneApi, ResourceRecordSet,
};
