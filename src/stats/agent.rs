//! Snapshot builder
//!
//! Queries every target mouse across the configured window catalog at the
//! ledger's current position and merges in the ledger-wide lane statistics.

use std::sync::Arc;
use tracing::{debug, warn};

use super::catalog::SnapshotConfig;
use super::snapshot::{CountWindowStats, IntervalEntry, LaneShare, MouseSnapshot, Snapshot};
use crate::core::{normalize_name, Mouse, Race};
use crate::error::Result;
use crate::ledger::RaceSystem;

/// Builds [`Snapshot`]s from a ledger
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    config: SnapshotConfig,
}

impl SnapshotBuilder {
    pub fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Snapshot the given targets (all registered mice when `None`)
    pub fn build<S>(&self, system: &S, targets: Option<&[String]>) -> Result<Snapshot>
    where
        S: RaceSystem + ?Sized,
    {
        let registry = system.registry();
        let lane_win_ratios = self.global_lane_distribution(system);

        let names = match targets {
            Some(targets) => targets.iter().map(|t| normalize_name(t)).collect(),
            None => registry.names(),
        };

        let mut records = Vec::with_capacity(names.len());
        let mut skipped = Vec::new();

        for name in names {
            let Some(mouse) = registry.get(&name) else {
                warn!("Skipping unknown mouse {}", name);
                continue;
            };
            match self.mouse_snapshot(mouse, &lane_win_ratios) {
                Ok(record) => records.push(record),
                Err(e) if e.is_recoverable() => {
                    debug!("Skipping {}: {}", name, e);
                    skipped.push(name);
                }
                Err(e) => return Err(e),
            }
        }

        // Stable: equal ratings keep registry order
        records.sort_by(|a, b| {
            b.site_rating
                .partial_cmp(&a.site_rating)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(Snapshot {
            records,
            skipped,
            lane_win_ratios,
            race_count: system.races().len(),
            as_of: system.latest_race().and_then(|r| r.reference_time()),
        })
    }

    /// Share of all resolved races won from each lane
    pub fn global_lane_distribution<S>(&self, system: &S) -> Vec<LaneShare>
    where
        S: RaceSystem + ?Sized,
    {
        lane_win_ratios(system.races(), system.lane_count())
            .into_iter()
            .enumerate()
            .map(|(lane, ratio)| LaneShare {
                label: self.config.catalog.lane_label(lane),
                ratio,
            })
            .collect()
    }

    /// Statistics for one mouse; `NoHistory` when it has not raced
    pub fn mouse_snapshot(
        &self,
        mouse: &Mouse,
        lane_win_ratios: &[LaneShare],
    ) -> Result<MouseSnapshot> {
        let catalog = &self.config.catalog;
        let policy = &self.config.escalation;

        let distribution = mouse.lane_distribution_among_wins(None)?;
        let current_lane_record = mouse.current_lane_win_loss(None, None)?;

        let last_races = catalog
            .race_counts
            .iter()
            .map(|&n| CountWindowStats::new(n, mouse.win_loss_last_n(n)))
            .collect();

        let current_lane_races = catalog
            .lane_race_counts
            .iter()
            .map(|&n| Ok(CountWindowStats::new(n, mouse.current_lane_win_loss(None, Some(n))?)))
            .collect::<Result<Vec<_>>>()?;

        let intervals = catalog
            .intervals
            .iter()
            .map(|window| {
                Ok(IntervalEntry {
                    label: window.label().to_string(),
                    stats: mouse.interval_statistics(window.duration(), policy)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(MouseSnapshot {
            name: mouse.name.clone(),
            family_id: mouse.family_id,
            site_rating: mouse.site_rating,
            color: mouse.color,
            age_days: mouse.age_days(),
            race_count: mouse.races().len(),
            completed: mouse.completed_count(),
            wins: mouse.win_count(),
            losses: mouse.loss_count(),
            resets: mouse.reset_count(),
            cancelled: mouse.cancelled_count(),
            lifetime_win_ratio: mouse.lifetime_win_ratio(),
            current_lane: distribution.current_lane,
            current_lane_label: catalog.lane_label(distribution.current_lane),
            lane_win_share: distribution.ratios,
            current_lane_win_share: distribution.current_lane_ratio,
            current_lane_record,
            repeat_wins: mouse.repeat_wins(),
            last_races,
            current_lane_races,
            intervals,
            global_lane_win_ratios: lane_win_ratios.to_vec(),
        })
    }
}

/// Normalized win counts per lane over completed races with a winner
pub fn lane_win_ratios(races: &[Arc<Race>], lane_count: usize) -> Vec<f64> {
    let mut wins = vec![0usize; lane_count];
    for race in races.iter().filter(|r| r.is_resolved()) {
        if let Some(slot) = race.winner_lane().and_then(|lane| wins.get_mut(lane)) {
            *slot += 1;
        }
    }

    let total = wins.iter().sum::<usize>().max(1) as f64;
    wins.into_iter().map(|w| w as f64 / total).collect()
}
