//! File-backed snapshot store
//!
//! One JSON file per source plus the report and alert-state files, all
//! written with the same discipline: serialize to a temp file in the same
//! directory, then rename over the target. Readers (the dashboard included)
//! see either the old or the new complete document, never a partial one, so
//! no locking is needed for single-writer / multi-reader access.

use crate::domain::{AlertState, Report, Snapshot, SourceId};
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const REPORT_FILE: &str = "report.json";
const ALERT_STATE_FILE: &str = ".alert_state.json";

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn snapshot_path(&self, source: SourceId) -> PathBuf {
        self.data_dir.join(format!("{source}.json"))
    }

    pub fn report_path(&self) -> PathBuf {
        self.data_dir.join(REPORT_FILE)
    }

    fn alert_state_path(&self) -> PathBuf {
        self.data_dir.join(ALERT_STATE_FILE)
    }

    /// Atomically replace the current snapshot for a source
    pub fn write_snapshot(&self, source: SourceId, data: Value) -> Result<Snapshot> {
        let snapshot = Snapshot::new(data);
        self.write_json(&self.snapshot_path(source), &snapshot)?;
        Ok(snapshot)
    }

    /// Current snapshot for a source, or None if never written
    pub fn read_snapshot(&self, source: SourceId) -> Result<Option<Snapshot>> {
        self.read_json(&self.snapshot_path(source))
    }

    pub fn write_report(&self, report: &Report) -> Result<()> {
        self.write_json(&self.report_path(), report)
    }

    pub fn read_report(&self) -> Result<Option<Report>> {
        self.read_json(&self.report_path())
    }

    pub fn write_alert_states(&self, states: &BTreeMap<String, AlertState>) -> Result<()> {
        self.write_json(&self.alert_state_path(), states)
    }

    /// Persisted alert states; empty map if never written
    pub fn read_alert_states(&self) -> Result<BTreeMap<String, AlertState>> {
        Ok(self.read_json(&self.alert_state_path())?.unwrap_or_default())
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let body = serde_json::to_vec_pretty(value)?;
        // Temp file in the same directory so the rename stays on one filesystem
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &body)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AlertStatus;
    use chrono::Utc;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, SnapshotStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_read_absent_snapshot() {
        let (_dir, store) = store();
        assert!(store.read_snapshot(SourceId::Flyover).unwrap().is_none());
        assert!(store.read_report().unwrap().is_none());
        assert!(store.read_alert_states().unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let (_dir, store) = store();
        let written = store
            .write_snapshot(SourceId::Powpeg, json!({"pegins": [], "pegouts": []}))
            .unwrap();
        let read = store.read_snapshot(SourceId::Powpeg).unwrap().unwrap();
        assert_eq!(read, written);
    }

    #[test]
    fn test_write_replaces_previous_and_leaves_no_temp() {
        let (_dir, store) = store();
        store
            .write_snapshot(SourceId::Flyover, json!({"count": 1}))
            .unwrap();
        store
            .write_snapshot(SourceId::Flyover, json!({"count": 2}))
            .unwrap();

        let read = store.read_snapshot(SourceId::Flyover).unwrap().unwrap();
        assert_eq!(read.data["count"], 2);

        let tmp = store.snapshot_path(SourceId::Flyover).with_extension("tmp");
        assert!(!tmp.exists());
    }

    #[test]
    fn test_file_on_disk_is_always_valid_json() {
        let (_dir, store) = store();
        store
            .write_snapshot(SourceId::BtcLocked, json!({"total_bridged_rbtc": 2700.5}))
            .unwrap();
        let raw = fs::read(store.snapshot_path(SourceId::BtcLocked)).unwrap();
        let parsed: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(parsed["data"]["total_bridged_rbtc"], 2700.5);
    }

    #[test]
    fn test_alert_state_round_trip() {
        let (_dir, store) = store();
        let mut states = BTreeMap::new();
        states.insert(
            "total_pegins".to_string(),
            AlertState {
                status: AlertStatus::Firing,
                last_value: 160.0,
                last_transition_at: Utc::now(),
            },
        );
        store.write_alert_states(&states).unwrap();
        assert_eq!(store.read_alert_states().unwrap(), states);
    }
}
