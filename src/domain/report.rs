use super::snapshot::SourceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Marker written into a section whose source has no usable snapshot
pub const UNAVAILABLE: &str = "unavailable";

/// Aggregated cross-source report, derived from the current snapshots.
///
/// `sections` holds each source's payload verbatim, or the string
/// `"unavailable"`. `aggregates` and `deltas` use sorted maps so that
/// identical inputs always serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub sections: BTreeMap<String, Value>,
    pub aggregates: BTreeMap<String, f64>,
    pub deltas: BTreeMap<String, f64>,
}

impl Report {
    pub fn is_unavailable(value: &Value) -> bool {
        value.as_str() == Some(UNAVAILABLE)
    }

    /// Payload of a source section, or None if absent/unavailable
    pub fn section(&self, source: SourceId) -> Option<&Value> {
        self.sections
            .get(source.as_str())
            .filter(|v| !Self::is_unavailable(v))
    }

    /// Resolve a metric path against this report.
    ///
    /// A bare name looks up `aggregates`; `deltas.<name>` looks up deltas;
    /// `<source_id>.<field>...` (optionally prefixed with `sections.`) walks
    /// into a section payload, indexing arrays by number. Booleans map to
    /// 1.0 / 0.0. Returns None when the metric is unavailable, in which case
    /// the rule is skipped for the cycle.
    pub fn metric(&self, path: &str) -> Option<f64> {
        if let Some(value) = self.aggregates.get(path) {
            return Some(*value);
        }
        let (head, rest) = path.split_once('.')?;
        match head {
            "aggregates" => self.aggregates.get(rest).copied(),
            "deltas" => self.deltas.get(rest).copied(),
            "sections" => self.section_metric(rest),
            _ => self.section_metric(path),
        }
    }

    fn section_metric(&self, path: &str) -> Option<f64> {
        let (source, rest) = path.split_once('.')?;
        let section = self.sections.get(source)?;
        if Self::is_unavailable(section) {
            return None;
        }
        let mut current = section;
        for segment in rest.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        match current {
            Value::Number(n) => n.as_f64(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_report() -> Report {
        let mut sections = BTreeMap::new();
        sections.insert(
            "flyover".to_string(),
            json!({"lp_info": {"pegin_rbtc": 12.5, "is_operational_pegin": true}}),
        );
        sections.insert("powpeg".to_string(), json!(UNAVAILABLE));

        let mut aggregates = BTreeMap::new();
        aggregates.insert("total_pegins".to_string(), 100.0);

        let mut deltas = BTreeMap::new();
        deltas.insert("total_pegins".to_string(), 0.0);

        Report {
            generated_at: Utc::now(),
            sections,
            aggregates,
            deltas,
        }
    }

    #[test]
    fn test_metric_resolves_aggregate() {
        let report = sample_report();
        assert_eq!(report.metric("total_pegins"), Some(100.0));
        assert_eq!(report.metric("aggregates.total_pegins"), Some(100.0));
    }

    #[test]
    fn test_metric_resolves_delta() {
        let report = sample_report();
        assert_eq!(report.metric("deltas.total_pegins"), Some(0.0));
    }

    #[test]
    fn test_metric_walks_section_payload() {
        let report = sample_report();
        assert_eq!(report.metric("flyover.lp_info.pegin_rbtc"), Some(12.5));
        assert_eq!(
            report.metric("sections.flyover.lp_info.pegin_rbtc"),
            Some(12.5)
        );
        // Booleans coerce to 1.0 / 0.0
        assert_eq!(
            report.metric("flyover.lp_info.is_operational_pegin"),
            Some(1.0)
        );
    }

    #[test]
    fn test_metric_skips_unavailable_section() {
        let report = sample_report();
        assert_eq!(report.metric("powpeg.pegins.0.value_rbtc"), None);
        assert_eq!(report.metric("missing_metric"), None);
        assert_eq!(report.metric("route_health.token_count"), None);
    }
}
