//! Incremental replay ledger
//!
//! Replays resolved races one at a time in completion order so statistics at
//! any point only reflect races already ingested.

use std::sync::Arc;
use tracing::{debug, info};

use super::registry::MouseRegistry;
use super::system::{build_races, LedgerConfig, RaceSystem};
use crate::core::Race;
use crate::error::Result;
use crate::models::{MouseRecord, RawRace};

#[derive(Debug)]
pub struct HistoricalRaceLedger {
    config: LedgerConfig,
    registry: MouseRegistry,
    races: Vec<Arc<Race>>,
    /// Completed, resolved races with only registered mice, by completion time
    pending: Vec<Arc<Race>>,
    current_offset: usize,
    rejected: usize,
}

impl HistoricalRaceLedger {
    /// Build the replay and ingest the first `primer_count` races
    pub fn new(
        records: &[MouseRecord],
        feed: &[RawRace],
        config: LedgerConfig,
        primer_count: usize,
    ) -> Result<Self> {
        let mut registry = MouseRegistry::from_records(records, config.lane_count)?;

        let (races, rejected) = build_races(feed, config.lane_count)?;
        let mut pending: Vec<Race> = races
            .into_iter()
            .filter(|race| {
                let all_known = registry.note_unregistered(race);
                all_known && race.is_resolved()
            })
            .collect();
        pending.sort_by(|a, b| (a.completed_at, &a.id).cmp(&(b.completed_at, &b.id)));

        info!(
            "Replay prepared: {} of {} races eligible, {} rejected, {} unregistered names",
            pending.len(),
            feed.len(),
            rejected,
            registry.unregistered().len()
        );

        let mut ledger = Self {
            config,
            registry,
            races: Vec::with_capacity(pending.len()),
            pending: pending.into_iter().map(Arc::new).collect(),
            current_offset: 0,
            rejected,
        };

        for _ in 0..primer_count {
            if ledger.ingest_next()?.is_none() {
                break;
            }
        }
        info!("Primed replay with {} races", ledger.current_offset);

        Ok(ledger)
    }

    /// Ingest the next pending race; `None` once the replay is exhausted
    pub fn ingest_next(&mut self) -> Result<Option<Arc<Race>>> {
        let Some(race) = self.pending.get(self.current_offset).cloned() else {
            return Ok(None);
        };

        self.registry.record_race(&race)?;
        self.races.push(Arc::clone(&race));
        self.current_offset += 1;
        debug!("Replayed race {} at offset {}", race.id, self.current_offset);

        Ok(Some(race))
    }

    /// Next race to be ingested, without ingesting it
    pub fn peek_next(&self) -> Option<&Arc<Race>> {
        self.pending.get(self.current_offset)
    }

    pub fn remaining(&self) -> usize {
        self.pending.len() - self.current_offset
    }

    pub fn current_offset(&self) -> usize {
        self.current_offset
    }

    /// Total number of races the replay will ingest
    pub fn eligible(&self) -> usize {
        self.pending.len()
    }
}

impl RaceSystem for HistoricalRaceLedger {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::RaceLedger;
    use crate::testing::{create_abcd_raw_races, create_abcd_records, create_raw_race};

    fn create_test_replay(primer: usize) -> HistoricalRaceLedger {
        HistoricalRaceLedger::new(
            &create_abcd_records(),
            &create_abcd_raw_races(),
            LedgerConfig::default(),
            primer,
        )
        .unwrap()
    }

    #[test]
    fn test_primer_ingests_first_races() {
        let ledger = create_test_replay(2);

        assert_eq!(ledger.current_offset(), 2);
        assert_eq!(ledger.races().len(), 2);
        assert_eq!(ledger.remaining(), 3);
        assert_eq!(ledger.latest_race().unwrap().id, "r2");
        assert_eq!(ledger.peek_next().unwrap().id, "r3");
    }

    #[test]
    fn test_ingest_until_exhausted() {
        let mut ledger = create_test_replay(0);
        assert!(ledger.latest_race().is_none());

        let mut ids = Vec::new();
        while let Some(race) = ledger.ingest_next().unwrap() {
            ids.push(race.id.clone());
        }

        assert_eq!(ids, vec!["r1", "r2", "r3", "r4", "r5"]);
        assert_eq!(ledger.remaining(), 0);
        assert!(ledger.peek_next().is_none());
        assert!(ledger.ingest_next().unwrap().is_none());
        assert_eq!(ledger.current_offset(), 5);
    }

    #[test]
    fn test_primer_larger_than_feed() {
        let ledger = create_test_replay(50);
        assert_eq!(ledger.current_offset(), 5);
        assert_eq!(ledger.remaining(), 0);
    }

    #[test]
    fn test_replay_filters_ineligible_races() {
        let mut feed = create_abcd_raw_races();
        let mut cancelled = create_raw_race("r6", ["a", "b", "c", "d"], 300, None);
        cancelled.race_cancelled = true;
        feed.push(cancelled);
        feed.push(create_raw_race("r7", ["a", "b", "c", "zeus"], 360, Some("a")));
        feed.push(create_raw_race("r8", ["a", "b", "c", "d"], 420, None));

        let ledger =
            HistoricalRaceLedger::new(&create_abcd_records(), &feed, LedgerConfig::default(), 0)
                .unwrap();

        assert_eq!(ledger.eligible(), 5);
        assert!(ledger.unregistered().contains("zeus"));
    }

    #[test]
    fn test_malformed_record_skipped() {
        let mut feed = create_abcd_raw_races();
        let mut garbage = create_raw_race("r9", ["a", "b", "c", "d"], 300, None);
        garbage.race_cancelled = true;
        garbage.race_complete = Some("garbage".to_string());
        feed.push(garbage);
        feed[2].mice.pop();

        let mut ledger =
            HistoricalRaceLedger::new(&create_abcd_records(), &feed, LedgerConfig::default(), 0)
                .unwrap();

        assert_eq!(ledger.rejected(), 2);
        assert_eq!(ledger.eligible(), 4);

        let mut ids = Vec::new();
        while let Some(race) = ledger.ingest_next().unwrap() {
            ids.push(race.id.clone());
        }
        assert_eq!(ids, vec!["r1", "r2", "r4", "r5"]);
    }

    #[test]
    fn test_replay_orders_by_completion() {
        let mut feed = create_abcd_raw_races();
        // r1 starts first but finishes last
        feed[0].race_complete = Some("2019-05-01T20:00:00.000Z".to_string());

        let mut ledger =
            HistoricalRaceLedger::new(&create_abcd_records(), &feed, LedgerConfig::default(), 5)
                .unwrap();

        assert_eq!(ledger.latest_race().unwrap().id, "r1");
        assert!(ledger.ingest_next().unwrap().is_none());
    }

    #[test]
    fn test_replay_matches_batch() {
        let mut replay = create_test_replay(0);
        while replay.ingest_next().unwrap().is_some() {}

        let batch = RaceLedger::new(
            &create_abcd_records(),
            &create_abcd_raw_races(),
            LedgerConfig::default(),
        )
        .unwrap();

        for (replayed, batched) in replay.registry().iter().zip(batch.registry().iter()) {
            assert_eq!(replayed.name, batched.name);
            assert_eq!(replayed.win_count(), batched.win_count());
            assert_eq!(replayed.loss_count(), batched.loss_count());
            assert_eq!(replayed.current_lane().unwrap(), batched.current_lane().unwrap());
            assert_eq!(replayed.win_loss_last_n(3), batched.win_loss_last_n(3));
            assert_eq!(replayed.repeat_wins(), batched.repeat_wins());
        }
    }
}
