//! Alert transition engine
//!
//! Pure function from (rule, value, previous state, now) to (next state,
//! optional notification). Keeping the clock a parameter makes cooldown
//! behavior testable without sleeping.

use crate::domain::{AlertRule, AlertState, AlertStatus, Notification, NotificationKind};
use chrono::{DateTime, Duration, Utc};

/// Evaluate one rule against its metric value.
///
/// Notifications are emitted on edges only: entering Firing, re-firing
/// after the cooldown elapses, and the single Firing -> Resolved edge.
/// Resolved decays to Idle silently once the condition stays false.
pub fn evaluate(
    rule: &AlertRule,
    value: f64,
    previous: Option<&AlertState>,
    now: DateTime<Utc>,
) -> (AlertState, Option<Notification>) {
    let breached = rule.operator.holds(value, rule.threshold);
    let status = previous.map(|s| s.status).unwrap_or(AlertStatus::Idle);

    let (next_status, transition_at, notify) = match (status, breached) {
        (AlertStatus::Idle | AlertStatus::Resolved, true) => {
            (AlertStatus::Firing, now, Some(NotificationKind::Firing))
        }
        (AlertStatus::Firing, true) => {
            let last = previous.map(|s| s.last_transition_at).unwrap_or(now);
            // Oversized cooldowns saturate instead of wrapping negative
            let cooldown = i64::try_from(rule.cooldown_seconds)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX);
            if now - last >= cooldown {
                // Still breached after the cooldown: re-fire and restart it
                (AlertStatus::Firing, now, Some(NotificationKind::Firing))
            } else {
                (AlertStatus::Firing, last, None)
            }
        }
        (AlertStatus::Firing, false) => {
            (AlertStatus::Resolved, now, Some(NotificationKind::Resolved))
        }
        (AlertStatus::Resolved, false) => (AlertStatus::Idle, now, None),
        (AlertStatus::Idle, false) => {
            let last = previous.map(|s| s.last_transition_at).unwrap_or(now);
            (AlertStatus::Idle, last, None)
        }
    };

    let state = AlertState {
        status: next_status,
        last_value: value,
        last_transition_at: transition_at,
    };
    let notification = notify.map(|kind| Notification {
        rule_id: rule.key().to_string(),
        kind,
        severity: rule.severity.clone(),
        metric: rule.metric.clone(),
        value,
        operator: rule.operator,
        threshold: rule.threshold,
        at: now,
    });
    (state, notification)
}
