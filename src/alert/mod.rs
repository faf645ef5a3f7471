//! Edge-triggered alerting
//!
//! Rules load fresh from disk each cycle, evaluate against the current
//! report through a pure transition function, and notify on state edges
//! only. State survives restarts via the snapshot store.

mod checker;
mod engine;
mod notifier;
mod rules;

pub use checker::AlertCheckStep;
pub use engine::evaluate;
pub use notifier::{LogNotifier, Notifier};
pub use rules::load_rules;
