//! Core data model for the monitoring pipeline
//!
//! Snapshots are point-in-time captures of one data source, the Report is
//! the derived cross-source aggregate, and alert types describe the rule /
//! state / notification side of the pipeline.

pub mod alert;
pub mod report;
pub mod snapshot;
pub mod sources;

pub use alert::{
    AlertRule, AlertState, AlertStatus, Comparator, Notification, NotificationKind,
};
pub use report::{Report, UNAVAILABLE};
pub use snapshot::{Snapshot, SourceId};
pub use sources::{
    BtcLockedPayload, ChangeKind, FlyoverPayload, FlyoverPegin, FlyoverPegout, LpInfo, PairLimits,
    Penalty, PowpegPayload, PowpegPegin, PowpegPegout, ProviderChange, ProviderStatus,
    RouteHealthPayload, UserRefund,
};
