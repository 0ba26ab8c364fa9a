//! Core race and participant modules

pub mod color;
pub mod mouse;
pub mod race;
pub mod summary;

// Re-export commonly used types
pub use color::MouseColor;
pub use mouse::{
    EscalationPolicy, IntervalStats, LaneDistribution, Mouse, Outcome, WinLoss, WinTimes,
    WindowRatio,
};
pub use race::{normalize_name, parse_timestamp, Race};
pub use summary::{RepeatWins, TimeSummary};
