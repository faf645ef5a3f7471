//! Source fetchers
//!
//! One `SourceFetcher` per monitored source. `FetchStep` wraps any fetcher
//! into a pipeline step: it bounds the call with a timeout, writes the
//! snapshot atomically on success, and on any failure leaves the previous
//! snapshot untouched.

mod btc_locked;
mod flyover;
mod powpeg;
mod route_health;

pub use btc_locked::BtcLockedFetcher;
pub use flyover::FlyoverFetcher;
pub use powpeg::PowpegFetcher;
pub use route_health::RouteHealthFetcher;

use crate::domain::SourceId;
use crate::error::{AtlasError, Result};
use crate::pipeline::Step;
use crate::store::SnapshotStore;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

/// A normalized data source. Implementations talk to the network; the
/// surrounding `FetchStep` owns timeout and snapshot persistence.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    fn source(&self) -> SourceId;

    /// Retrieve and normalize the source into its snapshot payload
    async fn fetch(&self) -> Result<Value>;
}

pub struct FetchStep {
    fetcher: Box<dyn SourceFetcher>,
    store: SnapshotStore,
    timeout: Duration,
    name: String,
}

impl FetchStep {
    pub fn new(fetcher: Box<dyn SourceFetcher>, store: SnapshotStore, timeout: Duration) -> Self {
        let name = format!("fetch_{}", fetcher.source());
        Self {
            fetcher,
            store,
            timeout,
            name,
        }
    }
}

#[async_trait]
impl Step for FetchStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<()> {
        let source = self.fetcher.source();
        let data = tokio::time::timeout(self.timeout, self.fetcher.fetch())
            .await
            .map_err(|_| AtlasError::Timeout(source.to_string()))??;
        let snapshot = self.store.write_snapshot(source, data)?;
        info!(source = %source, captured_at = %snapshot.timestamp, "snapshot updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticFetcher {
        result: std::sync::Mutex<Option<Result<Value>>>,
    }

    impl StaticFetcher {
        fn ok(value: Value) -> Self {
            Self {
                result: std::sync::Mutex::new(Some(Ok(value))),
            }
        }

        fn failing() -> Self {
            Self {
                result: std::sync::Mutex::new(Some(Err(AtlasError::MalformedResponse(
                    "bad payload".into(),
                )))),
            }
        }
    }

    #[async_trait]
    impl SourceFetcher for StaticFetcher {
        fn source(&self) -> SourceId {
            SourceId::Flyover
        }

        async fn fetch(&self) -> Result<Value> {
            self.result.lock().unwrap().take().unwrap()
        }
    }

    struct HangingFetcher;

    #[async_trait]
    impl SourceFetcher for HangingFetcher {
        fn source(&self) -> SourceId {
            SourceId::Powpeg
        }

        async fn fetch(&self) -> Result<Value> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(json!({}))
        }
    }

    #[tokio::test]
    async fn test_successful_fetch_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let step = FetchStep::new(
            Box::new(StaticFetcher::ok(json!({"pegins": []}))),
            store.clone(),
            Duration::from_secs(5),
        );
        assert_eq!(step.name(), "fetch_flyover");

        step.execute().await.unwrap();
        let snapshot = store.read_snapshot(SourceId::Flyover).unwrap().unwrap();
        assert_eq!(snapshot.data, json!({"pegins": []}));
    }

    #[tokio::test]
    async fn test_failed_fetch_retains_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store
            .write_snapshot(SourceId::Flyover, json!({"count": 100}))
            .unwrap();
        let before = std::fs::read(store.snapshot_path(SourceId::Flyover)).unwrap();

        let step = FetchStep::new(
            Box::new(StaticFetcher::failing()),
            store.clone(),
            Duration::from_secs(5),
        );
        assert!(step.execute().await.is_err());

        let after = std::fs::read(store.snapshot_path(SourceId::Flyover)).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresponsive_source_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let step = FetchStep::new(
            Box::new(HangingFetcher),
            store.clone(),
            Duration::from_secs(30),
        );

        let err = step.execute().await.unwrap_err();
        assert!(matches!(err, AtlasError::Timeout(_)));
        assert!(store.read_snapshot(SourceId::Powpeg).unwrap().is_none());
    }
}
