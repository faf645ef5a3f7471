use thiserror::Error;

/// Main error type for the monitoring pipeline
#[derive(Error, Debug)]
pub enum AtlasError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Alert rule configuration error: {0}")]
    RuleConfig(String),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fetch timed out for source {0}")]
    Timeout(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Storage errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Alert delivery errors
    #[error("Notification delivery failed: {0}")]
    Notification(String),

    // Aggregation errors
    #[error("Data unavailable: {0}")]
    Unavailable(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for AtlasError
pub type Result<T> = std::result::Result<T, AtlasError>;

impl AtlasError {
    /// Whether the error is expected to clear on a later cycle without
    /// operator intervention. Recoverable failures keep the previous
    /// snapshot and never stop the scheduler.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AtlasError::Http(_)
                | AtlasError::Timeout(_)
                | AtlasError::MalformedResponse(_)
                | AtlasError::Unavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(AtlasError::Timeout("flyover".into()).is_recoverable());
        assert!(AtlasError::MalformedResponse("missing items".into()).is_recoverable());
        assert!(!AtlasError::RuleConfig("bad operator".into()).is_recoverable());
        assert!(!AtlasError::Internal("bug".into()).is_recoverable());
    }
}
