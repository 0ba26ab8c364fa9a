//! Summary statistics and repeat-win streak encoding

use serde::{Deserialize, Serialize};

/// Arithmetic mean, `None` for no samples
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median (mean of the two middle samples for even counts)
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Distribution of winning race times (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub samples: usize,
}

impl TimeSummary {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        Some(Self {
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean: mean(samples)?,
            median: median(samples)?,
            samples: samples.len(),
        })
    }
}

/// Repeat-win streak summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepeatWins {
    /// Wins in a row ending at the most recent resolved race
    pub current: u32,
    pub average: f64,
    pub median: f64,
    pub max: u32,
    /// Streak lengths, oldest first
    pub streaks: Vec<u32>,
}

impl RepeatWins {
    /// Run-length encode wins from outcomes ordered newest first.
    ///
    /// A loss closes the open run; a run still open at the oldest outcome is kept.
    pub fn encode<I>(outcomes_newest_first: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut streaks = Vec::new();
        let mut current = 0u32;
        let mut leading = true;
        let mut run = 0u32;

        for won in outcomes_newest_first {
            if won {
                run += 1;
                if leading {
                    current += 1;
                }
            } else {
                leading = false;
                if run > 0 {
                    streaks.push(run);
                }
                run = 0;
            }
        }
        if run > 0 {
            streaks.push(run);
        }
        streaks.reverse();

        let lengths: Vec<f64> = streaks.iter().map(|&s| s as f64).collect();

        Self {
            current,
            average: mean(&lengths).unwrap_or(0.0),
            median: median(&lengths).unwrap_or(0.0),
            max: streaks.iter().copied().max().unwrap_or(0),
            streaks,
        }
    }
}
