use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The four monitored data sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    Flyover,
    Powpeg,
    BtcLocked,
    RouteHealth,
}

impl SourceId {
    /// All sources, in the fixed order they are fetched within a cycle
    pub const ALL: [SourceId; 4] = [
        SourceId::Flyover,
        SourceId::Powpeg,
        SourceId::BtcLocked,
        SourceId::RouteHealth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Flyover => "flyover",
            SourceId::Powpeg => "powpeg",
            SourceId::BtcLocked => "btc_locked",
            SourceId::RouteHealth => "route_health",
        }
    }

    pub fn parse(s: &str) -> Option<SourceId> {
        match s {
            "flyover" => Some(SourceId::Flyover),
            "powpeg" => Some(SourceId::Powpeg),
            "btc_locked" => Some(SourceId::BtcLocked),
            "route_health" => Some(SourceId::RouteHealth),
            _ => None,
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// On-disk snapshot envelope: `{"timestamp": ISO8601, "data": <payload>}`.
///
/// Exactly one current snapshot exists per source; the store replaces it
/// atomically so readers never observe a partial document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub data: Value,
}

impl Snapshot {
    pub fn new(data: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_round_trip() {
        for source in SourceId::ALL {
            assert_eq!(SourceId::parse(source.as_str()), Some(source));
        }
        assert_eq!(SourceId::parse("ethereum"), None);
    }

    #[test]
    fn test_snapshot_envelope_format() {
        let snapshot = Snapshot::new(serde_json::json!({"count": 3}));
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("timestamp").is_some());
        assert_eq!(value["data"]["count"], 3);
    }
}
