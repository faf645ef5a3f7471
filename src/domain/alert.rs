use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Threshold comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==")]
    Eq,
}

impl Comparator {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Gt => value > threshold,
            Comparator::Ge => value >= threshold,
            Comparator::Lt => value < threshold,
            Comparator::Le => value <= threshold,
            Comparator::Eq => value == threshold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Eq => "==",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One configured alert rule, immutable for the duration of a cycle.
///
/// Any field failing to parse rejects the whole rule set (fail closed).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertRule {
    /// Defaults to the metric path when omitted
    #[serde(default)]
    pub id: Option<String>,
    pub metric: String,
    pub operator: Comparator,
    pub threshold: f64,
    pub cooldown_seconds: u64,
    pub severity: String,
}

impl AlertRule {
    /// Stable key used for state tracking and deduplication
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.metric)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Idle,
    Firing,
    Resolved,
}

/// Per-rule evaluation state, persisted across cycles.
/// Transitions happen only on explicit rule evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertState {
    pub status: AlertStatus,
    pub last_value: f64,
    pub last_transition_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Firing,
    Resolved,
}

/// Edge-triggered notification emitted on a state transition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub rule_id: String,
    pub kind: NotificationKind,
    pub severity: String,
    pub metric: String,
    pub value: f64,
    pub operator: Comparator,
    pub threshold: f64,
    pub at: DateTime<Utc>,
}

impl Notification {
    /// Human-readable message body for delivery channels
    pub fn render(&self) -> String {
        match self.kind {
            NotificationKind::Firing => format!(
                "\u{1f534} {} [{}]\n{} = {} (threshold: {} {})",
                self.rule_id,
                self.severity.to_uppercase(),
                self.metric,
                self.value,
                self.operator,
                self.threshold,
            ),
            NotificationKind::Resolved => format!(
                "\u{2705} RESOLVED: {}\n{} = {} (threshold: {} {})",
                self.rule_id, self.metric, self.value, self.operator, self.threshold,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparator_holds() {
        assert!(Comparator::Gt.holds(160.0, 150.0));
        assert!(!Comparator::Gt.holds(150.0, 150.0));
        assert!(Comparator::Ge.holds(150.0, 150.0));
        assert!(Comparator::Lt.holds(4.0, 5.0));
        assert!(Comparator::Le.holds(5.0, 5.0));
        assert!(Comparator::Eq.holds(0.0, 0.0));
    }

    #[test]
    fn test_rule_parses_wire_format() {
        let rule: AlertRule = serde_json::from_str(
            r#"{"metric": "total_pegins", "operator": ">", "threshold": 150,
                "cooldown_seconds": 3600, "severity": "warning"}"#,
        )
        .unwrap();
        assert_eq!(rule.operator, Comparator::Gt);
        assert_eq!(rule.key(), "total_pegins");
    }

    #[test]
    fn test_rule_rejects_unknown_operator() {
        let result = serde_json::from_str::<AlertRule>(
            r#"{"metric": "x", "operator": "!=", "threshold": 1,
                "cooldown_seconds": 60, "severity": "warning"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rule_rejects_unknown_fields() {
        let result = serde_json::from_str::<AlertRule>(
            r#"{"metric": "x", "operator": ">", "threshold": 1,
                "cooldown_seconds": 60, "severity": "warning", "treshold": 2}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_notification_render_mentions_rule() {
        let n = Notification {
            rule_id: "total_pegins".into(),
            kind: NotificationKind::Firing,
            severity: "warning".into(),
            metric: "total_pegins".into(),
            value: 160.0,
            operator: Comparator::Gt,
            threshold: 150.0,
            at: Utc::now(),
        };
        let text = n.render();
        assert!(text.contains("total_pegins"));
        assert!(text.contains("WARNING"));
    }
}
