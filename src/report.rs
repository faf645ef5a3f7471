//! Cross-source report generation
//!
//! Builds the aggregated report from whatever snapshots exist on disk.
//! Absent or undecodable snapshots mark their section `"unavailable"` and
//! simply drop out of the aggregate set; the step itself only fails on
//! storage errors.

use crate::domain::{
    BtcLockedPayload, FlyoverPayload, PowpegPayload, Report, RouteHealthPayload, SourceId,
    UNAVAILABLE,
};
use crate::error::Result;
use crate::pipeline::Step;
use crate::store::SnapshotStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

pub struct ReportStep {
    store: SnapshotStore,
}

impl ReportStep {
    pub fn new(store: SnapshotStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Step for ReportStep {
    fn name(&self) -> &str {
        "report"
    }

    async fn execute(&self) -> Result<()> {
        let mut sections = BTreeMap::new();
        for source in SourceId::ALL {
            let section = match self.store.read_snapshot(source) {
                Ok(Some(snapshot)) => snapshot.data,
                Ok(None) => Value::String(UNAVAILABLE.to_string()),
                Err(e) => {
                    warn!(source = %source, "Unreadable snapshot: {e}");
                    Value::String(UNAVAILABLE.to_string())
                }
            };
            sections.insert(source.as_str().to_string(), section);
        }

        let previous = match self.store.read_report() {
            Ok(previous) => previous,
            Err(e) => {
                warn!("Unreadable previous report, deltas reset: {e}");
                None
            }
        };

        let report = build(sections, previous.as_ref(), Utc::now());
        self.store.write_report(&report)?;
        info!(
            aggregates = report.aggregates.len(),
            deltas = report.deltas.len(),
            "report written"
        );
        Ok(())
    }
}

/// Assemble a report from section payloads. Pure: identical sections and
/// previous report produce identical output modulo `generated_at`.
pub fn build(
    sections: BTreeMap<String, Value>,
    previous: Option<&Report>,
    generated_at: DateTime<Utc>,
) -> Report {
    let aggregates = compute_aggregates(&sections);

    let mut deltas = BTreeMap::new();
    if let Some(previous) = previous {
        for (key, value) in &aggregates {
            if let Some(prev) = previous.aggregates.get(key) {
                deltas.insert(key.clone(), value - prev);
            }
        }
    }

    Report {
        generated_at,
        sections,
        aggregates,
        deltas,
    }
}

fn compute_aggregates(sections: &BTreeMap<String, Value>) -> BTreeMap<String, f64> {
    let mut agg = BTreeMap::new();

    let flyover = section_payload::<FlyoverPayload>(sections, SourceId::Flyover);
    let powpeg = section_payload::<PowpegPayload>(sections, SourceId::Powpeg);

    if let Some(f) = &flyover {
        agg.insert("flyover_pegins".into(), f.pegins.len() as f64);
        agg.insert("flyover_pegouts".into(), f.pegouts.len() as f64);
        agg.insert(
            "flyover_pegin_volume_rbtc".into(),
            f.pegins.iter().map(|p| p.value_rbtc).sum(),
        );
        agg.insert(
            "flyover_pegout_volume_rbtc".into(),
            f.pegouts.iter().map(|p| p.amount_rbtc).sum(),
        );
        agg.insert("pending_pegouts".into(), pending_pegouts(f) as f64);
        agg.insert("penalty_count".into(), f.penalties.len() as f64);
        agg.insert(
            "penalty_total_rbtc".into(),
            f.penalties.iter().map(|p| p.penalty_rbtc).sum(),
        );
        agg.insert("user_refund_count".into(), f.user_refunds.len() as f64);
        if let Some(lp) = &f.lp_info {
            agg.insert("lp_pegin_balance_rbtc".into(), lp.pegin_rbtc);
            agg.insert("lp_pegout_balance_btc".into(), lp.pegout_btc);
            if let Some(utxos) = lp.btc_utxo_count {
                agg.insert("lp_btc_utxo_count".into(), utxos as f64);
            }
        }
    }

    if let Some(p) = &powpeg {
        agg.insert("powpeg_pegins".into(), p.pegins.len() as f64);
        agg.insert("powpeg_pegouts".into(), p.pegouts.len() as f64);
        agg.insert(
            "powpeg_pegin_volume_rbtc".into(),
            p.pegins.iter().map(|x| x.value_rbtc).sum(),
        );
        agg.insert(
            "powpeg_pegout_volume_rbtc".into(),
            p.pegouts.iter().map(|x| x.value_rbtc).sum(),
        );
    }

    // Totals only when both mechanisms reported; a half-total would trip
    // threshold rules during a single-source outage
    if let (Some(f), Some(p)) = (&flyover, &powpeg) {
        agg.insert(
            "total_pegins".into(),
            (f.pegins.len() + p.pegins.len()) as f64,
        );
        agg.insert(
            "total_pegouts".into(),
            (f.pegouts.len() + p.pegouts.len()) as f64,
        );
        agg.insert(
            "total_pegin_volume_rbtc".into(),
            agg["flyover_pegin_volume_rbtc"] + agg["powpeg_pegin_volume_rbtc"],
        );
        agg.insert(
            "total_pegout_volume_rbtc".into(),
            agg["flyover_pegout_volume_rbtc"] + agg["powpeg_pegout_volume_rbtc"],
        );
    }

    if let Some(b) = section_payload::<BtcLockedPayload>(sections, SourceId::BtcLocked) {
        if let Some(total) = b.total_bridged_rbtc {
            agg.insert("total_locked_rbtc".into(), total);
        }
        agg.insert("contract_locked_rbtc".into(), b.contract_locked_rbtc);
        agg.insert("contract_count".into(), b.contract_count as f64);
    }

    if let Some(r) = section_payload::<RouteHealthPayload>(sections, SourceId::RouteHealth) {
        agg.insert(
            "enabled_providers".into(),
            r.providers.iter().filter(|p| p.enabled).count() as f64,
        );
        agg.insert("token_count".into(), r.token_count as f64);
    }

    agg
}

/// Peg-out deposits whose quote hash never appeared in a refund event
fn pending_pegouts(payload: &FlyoverPayload) -> usize {
    let refunded: BTreeSet<&str> = payload
        .pegout_refund_hashes
        .iter()
        .map(String::as_str)
        .collect();
    payload
        .pegouts
        .iter()
        .filter(|p| !refunded.contains(p.quote_hash.as_str()))
        .count()
}

fn section_payload<T: serde::de::DeserializeOwned>(
    sections: &BTreeMap<String, Value>,
    source: SourceId,
) -> Option<T> {
    let value = sections.get(source.as_str())?;
    if Report::is_unavailable(value) {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}
