//! Feature Engineering
//!
//! Flatten a mouse snapshot into named numeric features for model input.
//! Names and values come from the same list so column order never drifts.

use crate::stats::{LaneShare, MouseSnapshot};

impl MouseSnapshot {
    /// Ordered `(name, value)` pairs; absent values become 0.0
    ///
    /// Ledger-wide lane ratios are left out; they are identical for every
    /// mouse of a race and are added once per example instead.
    pub fn named_features(&self) -> Vec<(String, f64)> {
        let mut features: Vec<(String, f64)> = vec![
            ("site_rating".into(), self.site_rating),
            ("family_id".into(), self.family_id as f64),
            ("color".into(), self.color.code() as f64),
            ("age_days".into(), self.age_days.unwrap_or(0) as f64),
            ("race_count".into(), self.race_count as f64),
            ("lifetime_win_ratio".into(), self.lifetime_win_ratio),
            ("current_lane".into(), self.current_lane as f64),
            ("current_lane_win_share".into(), self.current_lane_win_share),
            ("current_lane_win_ratio".into(), self.current_lane_record.ratio()),
            ("current_repeat_wins".into(), self.repeat_wins.current as f64),
            ("average_repeat_wins".into(), self.repeat_wins.average),
            ("median_repeat_wins".into(), self.repeat_wins.median),
            ("max_repeat_wins".into(), self.repeat_wins.max as f64),
        ];

        for (lane, share) in self.lane_win_share.iter().enumerate() {
            features.push((format!("lane{}_win_share", lane), *share));
        }

        for window in &self.last_races {
            features.push((format!("last_{}_win_ratio", window.races), window.win_ratio));
        }

        for window in &self.current_lane_races {
            features.push((
                format!("current_lane_last_{}_win_ratio", window.races),
                window.win_ratio,
            ));
        }

        for entry in &self.intervals {
            let label = &entry.label;
            let stats = &entry.stats;
            let times = stats.win_times.as_ref().map(|t| &t.summary);
            features.extend([
                (format!("{}_win_ratio", label), stats.win_ratio),
                (format!("{}_wins", label), stats.wins as f64),
                (format!("{}_losses", label), stats.losses as f64),
                (
                    format!("{}_current_lane_win_ratio", label),
                    stats.current_lane.ratio(),
                ),
                (
                    format!("{}_average_repeat_wins", label),
                    stats.average_repeat_wins,
                ),
                (format!("{}_max_repeat_wins", label), stats.max_repeat_wins as f64),
                (
                    format!("{}_mean_win_time", label),
                    times.map(|t| t.mean).unwrap_or(0.0),
                ),
                (
                    format!("{}_median_win_time", label),
                    times.map(|t| t.median).unwrap_or(0.0),
                ),
            ]);
        }

        features
    }

    /// Convert features to a flat vector for model input
    pub fn to_vec(&self) -> Vec<f64> {
        self.named_features().into_iter().map(|(_, v)| v).collect()
    }

    /// Feature column names, in [`MouseSnapshot::to_vec`] order
    pub fn feature_names(&self) -> Vec<String> {
        self.named_features().into_iter().map(|(n, _)| n).collect()
    }
}

/// Column names for the ledger-wide lane ratios
pub fn lane_ratio_names(shares: &[LaneShare]) -> Vec<String> {
    shares
        .iter()
        .map(|share| format!("global_{}_win_ratio", share.label))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::ledger::{LedgerConfig, RaceLedger};
    use crate::stats::{Snapshot, SnapshotBuilder};
    use crate::testing::{create_abcd_raw_races, create_abcd_records};

    use super::*;

    fn create_test_snapshot() -> Snapshot {
        let ledger = RaceLedger::new(
            &create_abcd_records(),
            &create_abcd_raw_races(),
            LedgerConfig::default(),
        )
        .unwrap();
        SnapshotBuilder::default().build(&ledger, None).unwrap()
    }

    #[test]
    fn test_names_and_values_align() {
        let snapshot = create_test_snapshot();
        let a = snapshot.get("a").unwrap();

        let names = a.feature_names();
        let values = a.to_vec();
        assert_eq!(names.len(), values.len());

        // 13 scalars + 4 lanes + 5 count windows + 7 lane windows + 14 intervals * 8
        assert_eq!(values.len(), 13 + 4 + 5 + 7 + 14 * 8);
    }

    #[test]
    fn test_feature_values() {
        let snapshot = create_test_snapshot();
        let a = snapshot.get("a").unwrap();
        let features: std::collections::HashMap<String, f64> =
            a.named_features().into_iter().collect();

        assert!((features["site_rating"] - 1500.0).abs() < 0.01);
        assert!((features["lifetime_win_ratio"] - 0.6).abs() < 0.01);
        assert!((features["color"] - 1.0).abs() < 0.01);
        assert!((features["lane0_win_share"] - 1.0).abs() < 0.01);
        assert!((features["last_5_win_ratio"] - 0.6).abs() < 0.01);
        assert!((features["1h_win_ratio"] - 0.5).abs() < 0.01);
        assert!((features["1h_mean_win_time"] - 30.5).abs() < 0.01);
    }

    #[test]
    fn test_missing_win_times_are_zero() {
        let snapshot = create_test_snapshot();
        let d = snapshot.get("d").unwrap();
        let features: std::collections::HashMap<String, f64> =
            d.named_features().into_iter().collect();

        assert_eq!(features["90d_mean_win_time"], 0.0);
        assert_eq!(features["90d_median_win_time"], 0.0);
    }

    #[test]
    fn test_names_stable_across_mice() {
        let snapshot = create_test_snapshot();
        let first = snapshot.records[0].feature_names();
        for record in &snapshot.records {
            assert_eq!(record.feature_names(), first);
        }
    }

    #[test]
    fn test_lane_ratio_names() {
        let snapshot = create_test_snapshot();
        assert_eq!(
            lane_ratio_names(&snapshot.lane_win_ratios),
            vec![
                "global_blue_win_ratio",
                "global_red_win_ratio",
                "global_green_win_ratio",
                "global_yellow_win_ratio"
            ]
        );
    }
}
