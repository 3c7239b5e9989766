//! netpulse core types shared by the registry, the filter engine and the live loop.

#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

pub mod presentation;
pub mod push;

pub use presentation::{Presentation, SemanticClass};
pub use push::{DashboardCounts, PushEvent, StatusUpdate, Transition};

/// Library errors for decoding wire payloads.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("unknown status: {0}")]
    UnknownStatus(String),
    #[error("malformed push envelope: {0}")]
    Envelope(#[from] serde_json::Error),
}

/// Reachability status of a monitored address.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Up,
    Down,
    Error,
    Unknown,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Up, Status::Down, Status::Error, Status::Unknown];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Up => "up",
            Status::Down => "down",
            Status::Error => "error",
            Status::Unknown => "unknown",
        }
    }

    /// Canonical parse: only the four wire strings are accepted.
    pub fn parse(s: &str) -> Option<Status> {
        Status::ALL.into_iter().find(|st| st.as_str() == s)
    }

    /// Lenient mapping used for row badges: anything else (or nothing) is `Unknown`.
    pub fn from_wire(s: Option<&str>) -> Status {
        s.and_then(Status::parse).unwrap_or(Status::Unknown)
    }

    pub fn presentation(self) -> Presentation {
        presentation::for_status(self)
    }

    /// Toast severity for a transition into this status.
    pub fn severity(self) -> Severity {
        match self {
            Status::Up => Severity::Success,
            Status::Down => Severity::Error,
            Status::Error | Status::Unknown => Severity::Warn,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Status {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::parse(s).ok_or_else(|| CoreError::UnknownStatus(s.to_string()))
    }
}

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warn,
    Error,
}

/// Opaque address identifier. The server sends integers; tests and fixtures often use strings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct AddressId(pub String);

impl AddressId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AddressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for AddressId {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

impl From<u64> for AddressId {
    fn from(v: u64) -> Self {
        Self(v.to_string())
    }
}

impl<'de> Deserialize<'de> for AddressId {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }
        Ok(match Raw::deserialize(de)? {
            Raw::Int(n) => AddressId(n.to_string()),
            Raw::Str(s) => AddressId(s),
        })
    }
}

pub mod prelude {
    pub use super::{
        AddressId, CoreError, DashboardCounts, Presentation, PushEvent, SemanticClass, Severity,
        Status, StatusUpdate, Transition,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_parse_rejects_other_text() {
        assert_eq!(Status::parse("down"), Some(Status::Down));
        assert_eq!(Status::parse("Down"), None);
        assert_eq!(Status::parse("Offline"), None);
        assert!("bogus".parse::<Status>().is_err());
        assert_eq!(Status::from_wire(Some("bogus")), Status::Unknown);
        assert_eq!(Status::from_wire(None), Status::Unknown);
    }

    #[test]
    fn severity_follows_new_status() {
        assert_eq!(Status::Up.severity(), Severity::Success);
        assert_eq!(Status::Down.severity(), Severity::Error);
        assert_eq!(Status::Error.severity(), Severity::Warn);
    }

    #[test]
    fn address_id_accepts_int_or_string() {
        let a: AddressId = serde_json::from_str("7").unwrap();
        let b: AddressId = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"7\"");
    }
}
