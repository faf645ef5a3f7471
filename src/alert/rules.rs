//! Alert rule file loading
//!
//! The rule file is re-read every cycle so edits take effect without a
//! restart. A missing file disables alerting; a malformed file rejects the
//! entire rule set so a typo cannot silently drop one rule.

use crate::domain::AlertRule;
use crate::error::{AtlasError, Result};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Load the rule file. `Ok(None)` means the file does not exist.
pub fn load_rules(path: &Path) -> Result<Option<Vec<AlertRule>>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let rules: Vec<AlertRule> = serde_json::from_slice(&bytes).map_err(|e| {
        AtlasError::RuleConfig(format!("invalid rule file {}: {e}", path.display()))
    })?;

    let mut seen = BTreeSet::new();
    for rule in &rules {
        if rule.metric.trim().is_empty() {
            return Err(AtlasError::RuleConfig(format!(
                "rule '{}' has an empty metric path",
                rule.key()
            )));
        }
        if !seen.insert(rule.key().to_string()) {
            return Err(AtlasError::RuleConfig(format!(
                "duplicate rule id '{}'",
                rule.key()
            )));
        }
    }

    Ok(Some(rules))
}
