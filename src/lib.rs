//! Atlas: Rootstock bridge monitoring pipeline
//!
//! Periodically fetches bridge activity from public APIs (Flyover LBC
//! events, the PowPeg Bridge precompile, aggregate locked-BTC statistics,
//! swap route health), persists each source as an atomic JSON snapshot,
//! derives a cross-source report, and raises edge-triggered threshold
//! alerts with cooldown-based re-notification.

pub mod adapters;
pub mod alert;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod report;
pub mod store;

pub use config::AppConfig;
pub use error::{AtlasError, Result};
pub use store::SnapshotStore;
