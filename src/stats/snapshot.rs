//! Snapshot records
//!
//! Plain data handed to consumers: no references back into the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{IntervalStats, MouseColor, RepeatWins, WinLoss};

/// Win/loss tally for one race-count window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountWindowStats {
    /// Race budget of the window
    pub races: usize,
    pub wins: u32,
    pub losses: u32,
    pub win_ratio: f64,
}

impl CountWindowStats {
    pub fn new(races: usize, tally: WinLoss) -> Self {
        Self {
            races,
            wins: tally.wins,
            losses: tally.losses,
            win_ratio: tally.ratio(),
        }
    }
}

/// Statistics for one named time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalEntry {
    pub label: String,
    #[serde(flatten)]
    pub stats: IntervalStats,
}

/// Share of wins for one lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneShare {
    pub label: String,
    pub ratio: f64,
}

/// Statistics for one mouse at one point of the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseSnapshot {
    pub name: String,
    pub family_id: u32,
    pub site_rating: f64,
    pub color: MouseColor,
    pub age_days: Option<i64>,

    pub race_count: usize,
    pub completed: usize,
    pub wins: usize,
    pub losses: usize,
    pub resets: usize,
    pub cancelled: usize,
    pub lifetime_win_ratio: f64,

    pub current_lane: usize,
    pub current_lane_label: String,
    /// This mouse's wins per lane, normalized
    pub lane_win_share: Vec<f64>,
    pub current_lane_win_share: f64,
    /// Whole-history record in the current lane
    pub current_lane_record: WinLoss,

    pub repeat_wins: RepeatWins,
    pub last_races: Vec<CountWindowStats>,
    pub current_lane_races: Vec<CountWindowStats>,
    pub intervals: Vec<IntervalEntry>,

    /// Ledger-wide lane-win distribution
    pub global_lane_win_ratios: Vec<LaneShare>,
}

/// One snapshot over a ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Highest site rating first
    pub records: Vec<MouseSnapshot>,
    /// Targets without history
    pub skipped: Vec<String>,
    pub lane_win_ratios: Vec<LaneShare>,
    pub race_count: usize,
    pub as_of: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn get(&self, name: &str) -> Option<&MouseSnapshot> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
