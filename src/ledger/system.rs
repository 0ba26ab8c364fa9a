//! Batch race ledger
//!
//! Loads a full feed at once: every race is kept, in event-start order, and
//! fed to the registered mice in its lanes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::registry::MouseRegistry;
use crate::core::Race;
use crate::error::{Error, Result};
use crate::models::{MouseRecord, RawRace};

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Lanes per race
    pub lane_count: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { lane_count: 4 }
    }
}

/// Read-only view shared by both ledgers
pub trait RaceSystem {
    fn registry(&self) -> &MouseRegistry;

    /// Ingested races, in ingestion order
    fn races(&self) -> &[Arc<Race>];

    fn lane_count(&self) -> usize;

    /// Feed records dropped as malformed
    fn rejected(&self) -> usize;

    fn unregistered(&self) -> &BTreeSet<String> {
        self.registry().unregistered()
    }

    fn latest_race(&self) -> Option<&Arc<Race>> {
        self.races().last()
    }
}

/// Full-history ledger
#[derive(Debug)]
pub struct RaceLedger {
    config: LedgerConfig,
    registry: MouseRegistry,
    races: Vec<Arc<Race>>,
    rejected: usize,
}

impl RaceLedger {
    pub fn new(records: &[MouseRecord], feed: &[RawRace], config: LedgerConfig) -> Result<Self> {
        let mut registry = MouseRegistry::from_records(records, config.lane_count)?;
        let (mut races, rejected) = build_races(feed, config.lane_count)?;

        races.sort_by(|a, b| {
            (a.event_starts_at, a.starts_at, &a.id).cmp(&(b.event_starts_at, b.starts_at, &b.id))
        });

        let races: Vec<Arc<Race>> = races.into_iter().map(Arc::new).collect();
        for race in &races {
            registry.record_race(race)?;
            debug!("Ingested race {} ({:?})", race.id, race.winner_name);
        }

        if !registry.unregistered().is_empty() {
            warn!(
                "{} lane names are not on the leaderboard",
                registry.unregistered().len()
            );
        }
        info!(
            "Loaded {} races for {} mice ({} rejected)",
            races.len(),
            registry.len(),
            rejected
        );

        Ok(Self {
            config,
            registry,
            races,
            rejected,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

impl RaceSystem for RaceLedger {
    fn registry(&self) -> &MouseRegistry {
        &self.registry
    }

    fn races(&self) -> &[Arc<Race>] {
        &self.races
    }

    fn lane_count(&self) -> usize {
        self.config.lane_count
    }

    fn rejected(&self) -> usize {
        self.rejected
    }
}

/// Build races from feed records.
///
/// Malformed records, including those with the wrong lane count, are logged
/// and dropped. Returns the races and the number dropped.
pub(crate) fn build_races(feed: &[RawRace], lane_count: usize) -> Result<(Vec<Race>, usize)> {
    let mut races = Vec::with_capacity(feed.len());
    let mut rejected = 0;

    for raw in feed {
        let built = Race::from_raw(raw).and_then(|race| {
            if race.lanes.len() != lane_count {
                return Err(Error::malformed(
                    &race.id,
                    format!("expected {} lanes, got {}", lane_count, race.lanes.len()),
                ));
            }
            Ok(race)
        });

        match built {
            Ok(race) => races.push(race),
            Err(e @ Error::MalformedRace { .. }) => {
                warn!("Rejecting feed record: {}", e);
                rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok((races, rejected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_abcd_raw_races, create_abcd_records, create_raw_race};

    #[test]
    fn test_batch_ledger_fixture() {
        let ledger = RaceLedger::new(
            &create_abcd_records(),
            &create_abcd_raw_races(),
            LedgerConfig::default(),
        )
        .unwrap();

        assert_eq!(ledger.races().len(), 5);
        assert_eq!(ledger.lane_count(), 4);
        assert!(ledger.unregistered().is_empty());

        let a = ledger.registry().get("a").unwrap();
        assert!((a.lifetime_win_ratio() - 0.6).abs() < 1e-9);
        assert_eq!(a.current_lane().unwrap(), 0);
    }

    #[test]
    fn test_batch_ledger_sorts_by_event_start() {
        let mut feed = create_abcd_raw_races();
        feed.reverse();

        let ledger =
            RaceLedger::new(&create_abcd_records(), &feed, LedgerConfig::default()).unwrap();

        let ids: Vec<&str> = ledger.races().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3", "r4", "r5"]);
        assert_eq!(ledger.latest_race().unwrap().id, "r5");
    }

    #[test]
    fn test_cancelled_race_kept_but_not_counted() {
        let mut feed = create_abcd_raw_races();
        let mut cancelled = create_raw_race("r6", ["a", "b", "c", "d"], 300, None);
        cancelled.race_cancelled = true;
        feed.push(cancelled);

        let ledger =
            RaceLedger::new(&create_abcd_records(), &feed, LedgerConfig::default()).unwrap();

        assert_eq!(ledger.races().len(), 6);
        let a = ledger.registry().get("a").unwrap();
        assert_eq!(a.races().len(), 6);
        assert_eq!(a.completed_count(), 5);
        assert_eq!(a.cancelled_count(), 1);
        assert!((a.lifetime_win_ratio() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_unregistered_names_not_fatal() {
        let mut feed = create_abcd_raw_races();
        feed.push(create_raw_race("r6", ["a", "zeus", "c", "d"], 300, Some("zeus")));

        let ledger =
            RaceLedger::new(&create_abcd_records(), &feed, LedgerConfig::default()).unwrap();

        assert_eq!(ledger.races().len(), 6);
        assert!(ledger.unregistered().contains("zeus"));
        assert_eq!(ledger.registry().get("a").unwrap().loss_count(), 3);
    }

    #[test]
    fn test_wrong_lane_count_rejected() {
        let mut feed = create_abcd_raw_races();
        feed[0].mice.pop();

        let ledger =
            RaceLedger::new(&create_abcd_records(), &feed, LedgerConfig::default()).unwrap();

        assert_eq!(ledger.rejected(), 1);
        assert_eq!(ledger.races().len(), 4);
        assert!(ledger.races().iter().all(|r| r.id != "r1"));
    }

    #[test]
    fn test_malformed_record_skipped() {
        let mut feed = create_abcd_raw_races();
        let mut garbage = create_raw_race("r9", ["a", "b", "c", "d"], 300, None);
        garbage.race_cancelled = true;
        garbage.race_complete = Some("garbage".to_string());
        feed.push(garbage);

        let ledger =
            RaceLedger::new(&create_abcd_records(), &feed, LedgerConfig::default()).unwrap();

        assert_eq!(ledger.rejected(), 1);
        assert_eq!(ledger.races().len(), 5);
        let a = ledger.registry().get("a").unwrap();
        assert!((a.lifetime_win_ratio() - 0.6).abs() < 1e-9);
        assert_eq!(a.cancelled_count(), 0);
    }

    #[test]
    fn test_build_races_counts_rejections() {
        let mut feed = create_abcd_raw_races();
        feed[1].mice.clear();
        feed[3].race_complete = Some("not a time".to_string());

        let (races, rejected) = build_races(&feed, 4).unwrap();
        let ids: Vec<&str> = races.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r3", "r5"]);
        assert_eq!(rejected, 2);
    }

    #[test]
    fn test_duplicate_race_is_fatal() {
        let mut feed = create_abcd_raw_races();
        feed.push(feed[0].clone());

        let err = RaceLedger::new(&create_abcd_records(), &feed, LedgerConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRace { .. }));
    }
}
