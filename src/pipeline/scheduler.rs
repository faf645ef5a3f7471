use super::step::{Step, StepOutcome};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// One pass over all steps. Transient; exists only for observability.
#[derive(Debug)]
pub struct Cycle {
    pub sequence: u64,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<StepOutcome>,
}

impl Cycle {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Drives an unbounded sequence of cycles at a fixed interval
pub struct Scheduler {
    steps: Vec<Box<dyn Step>>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(steps: Vec<Box<dyn Step>>, interval: Duration) -> Self {
        Self { steps, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run every step once, in order, isolating failures per step
    pub async fn run_cycle(&self, sequence: u64) -> Cycle {
        let started_at = Utc::now();
        info!(cycle = sequence, "cycle started");

        let mut outcomes = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let clock = Instant::now();
            let result = step.execute().await;
            let duration_ms = clock.elapsed().as_millis() as u64;

            match &result {
                Ok(()) => {
                    debug!(cycle = sequence, step = step.name(), duration_ms, "step ok")
                }
                Err(e) => {
                    error!(
                        cycle = sequence,
                        step = step.name(),
                        duration_ms,
                        "step failed: {e}"
                    )
                }
            }

            outcomes.push(StepOutcome {
                step: step.name().to_string(),
                error: result.err().map(|e| e.to_string()),
                duration_ms,
            });
        }

        let cycle = Cycle {
            sequence,
            started_at,
            outcomes,
        };
        info!(
            cycle = sequence,
            succeeded = cycle.succeeded(),
            failed = cycle.failed(),
            "cycle complete"
        );
        cycle
    }

    /// Cycle forever at the configured interval. Returns only when the
    /// future is dropped (process shutdown).
    pub async fn run(&self) {
        let mut sequence: u64 = 0;
        loop {
            sequence += 1;
            self.run_cycle(sequence).await;
            debug!(
                interval_secs = self.interval.as_secs(),
                "sleeping until next cycle"
            );
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AtlasError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct CountingStep {
        name: String,
        calls: Arc<AtomicU32>,
        fail: bool,
    }

    #[async_trait]
    impl Step for CountingStep {
        fn name(&self) -> &str {
            &self.name
        }

        async fn execute(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AtlasError::Internal("boom".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_failed_step_does_not_abort_cycle() {
        let first = Arc::new(AtomicU32::new(0));
        let last = Arc::new(AtomicU32::new(0));
        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(CountingStep {
                name: "fetch_flyover".into(),
                calls: first.clone(),
                fail: true,
            }),
            Box::new(CountingStep {
                name: "generate_report".into(),
                calls: last.clone(),
                fail: false,
            }),
        ];
        let scheduler = Scheduler::new(steps, Duration::from_secs(300));

        let cycle = scheduler.run_cycle(1).await;

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 1);
        assert_eq!(cycle.failed(), 1);
        assert_eq!(cycle.succeeded(), 1);
        assert!(cycle.outcomes[0].error.as_deref().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_steps_run_in_declaration_order() {
        let order: Arc<std::sync::Mutex<Vec<&'static str>>> = Arc::default();

        struct OrderedStep {
            name: &'static str,
            order: Arc<std::sync::Mutex<Vec<&'static str>>>,
        }

        #[async_trait]
        impl Step for OrderedStep {
            fn name(&self) -> &str {
                self.name
            }
            async fn execute(&self) -> Result<()> {
                self.order.lock().unwrap().push(self.name);
                Ok(())
            }
        }

        let steps: Vec<Box<dyn Step>> = ["a", "b", "c"]
            .into_iter()
            .map(|name| {
                Box::new(OrderedStep {
                    name,
                    order: order.clone(),
                }) as Box<dyn Step>
            })
            .collect();

        Scheduler::new(steps, Duration::from_secs(1)).run_cycle(7).await;
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }
}
