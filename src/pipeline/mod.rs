//! Scheduler loop and the step abstraction it drives
//!
//! The six pipeline actions (four source fetches, report generation, alert
//! check) share the `Step` capability and run in a fixed order each cycle.
//! A failing step is logged and the cycle continues; nothing stops the loop
//! short of process termination.

pub mod scheduler;
pub mod step;

pub use scheduler::{Cycle, Scheduler};
pub use step::{Step, StepOutcome};
