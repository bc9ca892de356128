use super::level::EventLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The event shape handed to the error-tracking client.
///
/// Built fresh for every record and moved into the client call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub level: EventLevel,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub message: String,
    pub extra: Map<String, Value>,
    pub tags: BTreeMap<String, String>,
}

impl EventPayload {
    pub fn category(&self) -> Option<&str> {
        self.tags.get("category").map(String::as_str)
    }

    /// Timestamp as a UTC date, `None` when it is not representable.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        if !self.timestamp.is_finite() {
            return None;
        }
        let secs = self.timestamp.floor();
        let nanos = ((self.timestamp - secs) * 1_000_000_000.0).round() as u32;
        DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
    }
}
