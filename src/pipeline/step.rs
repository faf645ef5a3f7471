use crate::error::Result;
use async_trait::async_trait;

/// One isolated pipeline action
#[async_trait]
pub trait Step: Send + Sync {
    /// Stable identifier used in logs and cycle outcomes
    fn name(&self) -> &str;

    /// Run the action. Errors are reported to the scheduler, never panics.
    async fn execute(&self) -> Result<()>;
}

/// Result of one step within a cycle, kept for logging only
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub step: String,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl StepOutcome {
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}
