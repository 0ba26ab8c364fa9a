//! Training dataset generation
//!
//! Walks a replay ledger race by race. Each example is built from the lane
//! mice's snapshot taken *before* the race is ingested, so features never see
//! the race they are labelled with.

use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use super::features::lane_ratio_names;
use crate::core::Race;
use crate::error::Result;
use crate::ledger::HistoricalRaceLedger;
use crate::stats::SnapshotBuilder;

/// One labelled race
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub race_id: String,
    /// Mouse names in lane order
    pub mouse_names: Vec<String>,
    /// Lane-ordered mouse features followed by global lane ratios
    pub features: Vec<f64>,
    /// Winning lane
    pub label: usize,
}

/// Generated examples with their column names
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub feature_names: Vec<String>,
    pub examples: Vec<Example>,
    /// Races ingested without producing an example
    pub skipped: usize,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Build a DataFrame: race_id, mouse_{i}_name, features, winner_position_ndx
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let lane_count = self
            .examples
            .first()
            .map(|e| e.mouse_names.len())
            .unwrap_or(0);

        let mut columns = Vec::with_capacity(2 + lane_count + self.feature_names.len());
        columns.push(Series::new(
            "race_id",
            self.examples
                .iter()
                .map(|e| e.race_id.as_str())
                .collect::<Vec<_>>(),
        ));

        for lane in 0..lane_count {
            columns.push(Series::new(
                &format!("mouse_{}_name", lane),
                self.examples
                    .iter()
                    .map(|e| e.mouse_names.get(lane).map(String::as_str).unwrap_or(""))
                    .collect::<Vec<_>>(),
            ));
        }

        for (i, name) in self.feature_names.iter().enumerate() {
            columns.push(Series::new(
                name,
                self.examples
                    .iter()
                    .map(|e| e.features.get(i).copied().unwrap_or(0.0))
                    .collect::<Vec<f64>>(),
            ));
        }

        columns.push(Series::new(
            "winner_position_ndx",
            self.examples
                .iter()
                .map(|e| e.label as i64)
                .collect::<Vec<_>>(),
        ));

        Ok(DataFrame::new(columns)?)
    }

    /// Write the dataset as CSV with a header row
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut df = self.to_dataframe()?;
        let mut file = File::create(path.as_ref())?;
        CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
        info!(
            "Wrote {} examples to {}",
            self.examples.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

/// Drives a replay ledger to produce labelled examples
#[derive(Debug, Clone, Default)]
pub struct DatasetBuilder {
    snapshots: SnapshotBuilder,
}

impl DatasetBuilder {
    pub fn new(snapshots: SnapshotBuilder) -> Self {
        Self { snapshots }
    }

    /// Generate up to `limit` examples from the remaining replay
    pub fn generate(
        &self,
        ledger: &mut HistoricalRaceLedger,
        limit: Option<usize>,
    ) -> Result<TrainingSet> {
        self.generate_with(ledger, limit, |_| {})
    }

    /// Like [`DatasetBuilder::generate`], calling `on_race` after each ingest
    pub fn generate_with<F>(
        &self,
        ledger: &mut HistoricalRaceLedger,
        limit: Option<usize>,
        mut on_race: F,
    ) -> Result<TrainingSet>
    where
        F: FnMut(&Race),
    {
        let mut set = TrainingSet::default();

        while let Some(race) = ledger.peek_next().cloned() {
            if limit.is_some_and(|limit| set.examples.len() >= limit) {
                break;
            }

            match self.example_for(ledger, &race)? {
                Some((names, example)) => {
                    if set.feature_names.is_empty() {
                        set.feature_names = names;
                    }
                    set.examples.push(example);
                }
                None => {
                    debug!("No example for race {}: lane mouse without history", race.id);
                    set.skipped += 1;
                }
            }

            ledger.ingest_next()?;
            on_race(race.as_ref());
        }

        info!(
            "Generated {} examples ({} races skipped)",
            set.examples.len(),
            set.skipped
        );
        Ok(set)
    }

    /// Example for `race` from the ledger's current state
    fn example_for(
        &self,
        ledger: &HistoricalRaceLedger,
        race: &Race,
    ) -> Result<Option<(Vec<String>, Example)>> {
        let Some(label) = race.winner_lane() else {
            return Ok(None);
        };

        let snapshot = self.snapshots.build(ledger, Some(race.lanes.as_slice()))?;
        if !snapshot.skipped.is_empty() {
            return Ok(None);
        }

        let mut names = Vec::new();
        let mut features = Vec::new();
        for (lane, mouse) in race.lanes.iter().enumerate() {
            let Some(record) = snapshot.get(mouse) else {
                return Ok(None);
            };
            let label = self.snapshots.config().catalog.lane_label(lane);
            for (name, value) in record.named_features() {
                names.push(format!("{}_{}", label, name));
                features.push(value);
            }
        }

        names.extend(lane_ratio_names(&snapshot.lane_win_ratios));
        features.extend(snapshot.lane_win_ratios.iter().map(|s| s.ratio));

        Ok(Some((
            names,
            Example {
                race_id: race.id.clone(),
                mouse_names: race.lanes.clone(),
                features,
                label,
            },
        )))
    }
}
