//! Snapshot statistics over a race ledger

pub mod agent;
pub mod catalog;
pub mod snapshot;

pub use agent::{lane_win_ratios, SnapshotBuilder};
pub use catalog::{NamedWindow, SnapshotConfig, WindowCatalog};
pub use snapshot::{CountWindowStats, IntervalEntry, LaneShare, MouseSnapshot, Snapshot};
