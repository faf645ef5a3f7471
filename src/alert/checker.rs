//! Alert check pipeline step
//!
//! Reloads rules, evaluates every rule against the current report, persists
//! the updated state file, then delivers notifications. Persist-then-deliver
//! ordering means a delivery outage can lose a message but never replays a
//! transition on the next cycle.

use super::{engine, load_rules, Notifier};
use crate::domain::{Notification, Report};
use crate::error::Result;
use crate::pipeline::Step;
use crate::store::SnapshotStore;
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct AlertCheckStep {
    store: SnapshotStore,
    rules_path: PathBuf,
    notifier: Arc<dyn Notifier>,
}

impl AlertCheckStep {
    pub fn new(
        store: SnapshotStore,
        rules_path: impl Into<PathBuf>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            rules_path: rules_path.into(),
            notifier,
        }
    }

    fn evaluate_all(&self, report: &Report) -> Result<Vec<Notification>> {
        let Some(rules) = load_rules(&self.rules_path)? else {
            debug!(
                path = %self.rules_path.display(),
                "No rule file, alerting disabled"
            );
            return Ok(Vec::new());
        };

        let mut states = self.store.read_alert_states()?;
        let mut notifications = Vec::new();
        let now = Utc::now();

        for rule in &rules {
            let Some(value) = report.metric(&rule.metric) else {
                debug!(rule = rule.key(), metric = %rule.metric, "Metric unavailable, rule skipped");
                continue;
            };
            let (state, notification) =
                engine::evaluate(rule, value, states.get(rule.key()), now);
            states.insert(rule.key().to_string(), state);
            notifications.extend(notification);
        }

        // State goes to disk before delivery is attempted
        self.store.write_alert_states(&states)?;
        Ok(notifications)
    }
}

#[async_trait]
impl Step for AlertCheckStep {
    fn name(&self) -> &str {
        "alert_check"
    }

    async fn execute(&self) -> Result<()> {
        let Some(report) = self.store.read_report()? else {
            debug!("No report yet, nothing to check");
            return Ok(());
        };

        let notifications = self.evaluate_all(&report)?;
        for notification in &notifications {
            info!(
                rule = %notification.rule_id,
                kind = ?notification.kind,
                value = notification.value,
                "alert transition"
            );
            if let Err(e) = self.notifier.deliver(notification).await {
                warn!(
                    rule = %notification.rule_id,
                    channel = self.notifier.name(),
                    "Notification delivery failed: {e}"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::LogNotifier;
    use crate::domain::{AlertStatus, SourceId};
    use crate::error::AtlasError;
    use serde_json::json;
    use std::fs;
    use std::sync::Mutex;

    struct RecordingNotifier {
        delivered: Mutex<Vec<Notification>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                delivered: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn deliver(&self, notification: &Notification) -> Result<()> {
            if self.fail {
                return Err(AtlasError::Notification("channel down".into()));
            }
            self.delivered.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    fn setup(threshold_breached: bool) -> (tempfile::TempDir, SnapshotStore, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store
            .write_snapshot(
                SourceId::BtcLocked,
                json!({
                    "total_bridged_rbtc": if threshold_breached { 500.0 } else { 3000.0 },
                    "contract_locked_rbtc": 0.0,
                    "contract_count": 0
                }),
            )
            .unwrap();

        let rules_path = dir.path().join("alert_config.json");
        fs::write(
            &rules_path,
            r#"[{"metric": "total_locked_rbtc", "operator": "<", "threshold": 1000,
                 "cooldown_seconds": 3600, "severity": "critical"}]"#,
        )
        .unwrap();
        (dir, store, rules_path)
    }

    async fn run_report(store: &SnapshotStore) {
        crate::report::ReportStep::new(store.clone())
            .execute()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_breach_fires_and_persists_state() {
        let (_dir, store, rules_path) = setup(true);
        run_report(&store).await;

        let notifier = RecordingNotifier::new(false);
        let step = AlertCheckStep::new(store.clone(), &rules_path, notifier.clone());
        step.execute().await.unwrap();

        let states = store.read_alert_states().unwrap();
        assert_eq!(
            states["total_locked_rbtc"].status,
            AlertStatus::Firing
        );
        let delivered = notifier.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].rule_id, "total_locked_rbtc");
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_state_and_step_succeeds() {
        let (_dir, store, rules_path) = setup(true);
        run_report(&store).await;

        let step = AlertCheckStep::new(store.clone(), &rules_path, RecordingNotifier::new(true));
        step.execute().await.unwrap();

        let states = store.read_alert_states().unwrap();
        assert_eq!(
            states["total_locked_rbtc"].status,
            AlertStatus::Firing
        );
    }

    #[tokio::test]
    async fn test_malformed_rules_fail_step_without_state_change() {
        let (_dir, store, rules_path) = setup(true);
        run_report(&store).await;
        fs::write(&rules_path, "[{\"metric\": 42}]").unwrap();

        let step = AlertCheckStep::new(store.clone(), &rules_path, Arc::new(LogNotifier));
        assert!(matches!(
            step.execute().await,
            Err(AtlasError::RuleConfig(_))
        ));
        assert!(store.read_alert_states().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_rule_file_is_a_no_op() {
        let (_dir, store, rules_path) = setup(false);
        run_report(&store).await;
        fs::remove_file(&rules_path).unwrap();

        let step = AlertCheckStep::new(store.clone(), &rules_path, Arc::new(LogNotifier));
        step.execute().await.unwrap();
        assert!(store.read_alert_states().unwrap().is_empty());
    }
}
