//! Window catalogs for snapshots
//!
//! Count windows are plain race counts; time windows carry a short label
//! (`"12h"`, `"30d"`) that doubles as their serialized form.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::EscalationPolicy;
use crate::error::Error;

/// A labelled time window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamedWindow {
    label: String,
    duration: Duration,
}

impl NamedWindow {
    fn of(amount: i64, unit: char) -> Option<Self> {
        let duration = match unit {
            'm' => Duration::try_minutes(amount),
            'h' => Duration::try_hours(amount),
            'd' => Duration::try_days(amount),
            'w' => Duration::try_weeks(amount),
            _ => None,
        }?;
        Some(Self {
            label: format!("{}{}", amount, unit),
            duration,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl FromStr for NamedWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        let invalid = || Error::InvalidWindow(s.to_string());

        let unit = label.chars().last().ok_or_else(invalid)?;
        let amount: i64 = label
            .strip_suffix(unit)
            .and_then(|digits| digits.parse().ok())
            .filter(|&n| n > 0)
            .ok_or_else(invalid)?;

        Self::of(amount, unit).ok_or_else(invalid)
    }
}

impl TryFrom<String> for NamedWindow {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NamedWindow> for String {
    fn from(window: NamedWindow) -> Self {
        window.label
    }
}

impl fmt::Display for NamedWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Which windows a snapshot reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowCatalog {
    /// Budgets for `win_loss_last_n`
    pub race_counts: Vec<usize>,
    /// Budgets for `current_lane_win_loss`
    pub lane_race_counts: Vec<usize>,
    pub intervals: Vec<NamedWindow>,
    /// Display name per lane index
    pub lane_labels: Vec<String>,
}

impl Default for WindowCatalog {
    fn default() -> Self {
        let intervals = [
            (1, 'h'),
            (2, 'h'),
            (3, 'h'),
            (4, 'h'),
            (8, 'h'),
            (12, 'h'),
            (24, 'h'),
            (2, 'd'),
            (3, 'd'),
            (6, 'd'),
            (10, 'd'),
            (30, 'd'),
            (60, 'd'),
            (90, 'd'),
        ];

        Self {
            race_counts: vec![5, 10, 25, 50, 100],
            lane_race_counts: vec![5, 10, 25, 50, 100, 250, 500],
            intervals: intervals
                .iter()
                .filter_map(|&(amount, unit)| NamedWindow::of(amount, unit))
                .collect(),
            lane_labels: ["blue", "red", "green", "yellow"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl WindowCatalog {
    /// Label for a lane index, falling back to `lane{n}`
    pub fn lane_label(&self, lane: usize) -> String {
        self.lane_labels
            .get(lane)
            .cloned()
            .unwrap_or_else(|| format!("lane{}", lane))
    }
}

/// Snapshot builder configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub catalog: WindowCatalog,
    pub escalation: EscalationPolicy,
}
