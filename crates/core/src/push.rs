//! Push-channel payloads as the monitoring server emits them.
//!
//! Envelopes look like `{"event": "status_update", "data": {...}}`. Status strings
//! are decoded leniently: anything outside the four canonical values becomes
//! `unknown`, matching how a row badge would render it.

#![forbid(unsafe_code)]

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{AddressId, CoreError, Status};

/// Message type carried by `status_update` payloads that hold transitions.
pub const STATUS_CHANGES: &str = "status_changes";

/// One status transition for one address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transition {
    pub id: AddressId,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default, alias = "old_status", deserialize_with = "lenient_opt_status")]
    pub previous_status: Option<Status>,
    #[serde(default = "missing_status", deserialize_with = "lenient_status")]
    pub new_status: Status,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub response_time: Option<f64>,
}

impl Transition {
    pub fn new(id: impl Into<AddressId>, new_status: Status) -> Self {
        Self {
            id: id.into(),
            ip_address: None,
            previous_status: None,
            new_status,
            timestamp: None,
            group_name: None,
            response_time: None,
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn at(mut self, ts: impl Into<String>) -> Self {
        self.timestamp = Some(ts.into());
        self
    }

    /// Name shown to humans: the IP when known, otherwise the raw id.
    pub fn display_name(&self) -> &str {
        self.ip_address.as_deref().unwrap_or(self.id.as_str())
    }

    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

/// Payload of a `status_update` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusUpdate {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Vec<Transition>,
}

impl StatusUpdate {
    pub fn changes(data: Vec<Transition>) -> Self {
        Self { kind: STATUS_CHANGES.to_string(), data }
    }

    pub fn is_status_changes(&self) -> bool {
        self.kind == STATUS_CHANGES
    }
}

/// Aggregate counts from a `dashboard_update` event. Missing fields leave their slot untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardCounts {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub up: Option<u64>,
    #[serde(default)]
    pub down: Option<u64>,
    #[serde(default)]
    pub error: Option<u64>,
    #[serde(default)]
    pub unknown: Option<u64>,
}

/// Inbound push-channel event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PushEvent {
    StatusUpdate(StatusUpdate),
    DashboardUpdate(DashboardCounts),
    #[serde(rename = "connect")]
    Connected,
    #[serde(rename = "disconnect")]
    Disconnected,
}

impl PushEvent {
    pub fn from_envelope(line: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(line)?)
    }
}

/// Accepts RFC 3339 and the naive `isoformat()` output the server emits.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

pub fn render_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn missing_status() -> Status {
    Status::Unknown
}

fn lenient_status<'de, D: Deserializer<'de>>(de: D) -> Result<Status, D::Error> {
    let raw = Option::<String>::deserialize(de)?;
    Ok(Status::from_wire(raw.as_deref()))
}

fn lenient_opt_status<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Status>, D::Error> {
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.map(|s| Status::from_wire(Some(&s))))
}
