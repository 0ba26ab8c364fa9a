//! Race entity
//!
//! Immutable record of one completed, reset or cancelled race. Built once from a
//! feed record; lane index is the position of the mouse in `lanes`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::models::RawRace;

/// A single race
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Race {
    pub id: String,
    pub lanes: Vec<String>,
    pub event_starts_at: Option<DateTime<Utc>>,
    pub staging_at: Option<DateTime<Utc>>,
    pub betting_opens_at: Option<DateTime<Utc>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_reset: bool,
    pub is_cancelled: bool,
    pub winner_name: Option<String>,
    pub runner_up_name: Option<String>,
}

impl Race {
    /// Normalize a feed record into a race
    pub fn from_raw(raw: &RawRace) -> Result<Self> {
        if raw.mice.is_empty() {
            return Err(Error::malformed(&raw.id, "race has no lanes"));
        }

        let lanes: Vec<String> = raw.mice.iter().map(|m| normalize_name(m)).collect();

        let mut seen = HashSet::with_capacity(lanes.len());
        for name in &lanes {
            if !seen.insert(name.as_str()) {
                return Err(Error::malformed(
                    &raw.id,
                    format!("{} appears in more than one lane", name),
                ));
            }
        }

        let winner_name = raw.winner_name.as_deref().and_then(normalize_optional_name);
        if let Some(ref winner) = winner_name {
            if !lanes.contains(winner) {
                return Err(Error::malformed(
                    &raw.id,
                    format!("winner {} is not in lanes {:?}", winner, lanes),
                ));
            }
        }

        let parse = |field: &str, value: &Option<String>| -> Result<Option<DateTime<Utc>>> {
            value
                .as_deref()
                .map(|ts| {
                    parse_timestamp(ts).ok_or_else(|| {
                        Error::malformed(&raw.id, format!("unparsable {} timestamp {:?}", field, ts))
                    })
                })
                .transpose()
        };

        Ok(Self {
            id: raw.id.clone(),
            lanes,
            event_starts_at: parse("eventStart", &raw.event_start)?,
            staging_at: parse("staging", &raw.staging)?,
            betting_opens_at: parse("bettingOpens", &raw.betting_opens)?,
            starts_at: parse("raceStarts", &raw.race_starts)?,
            completed_at: parse("raceComplete", &raw.race_complete)?,
            is_reset: raw.race_is_reset,
            is_cancelled: raw.race_cancelled,
            winner_name,
            runner_up_name: raw.runner_up_name.as_deref().and_then(normalize_optional_name),
        })
    }

    /// Completed means resolved and neither reset nor cancelled
    pub fn completed(&self) -> bool {
        self.completed_at.is_some() && !self.is_reset && !self.is_cancelled
    }

    /// Completed with a known winner
    pub fn is_resolved(&self) -> bool {
        self.completed() && self.winner_name.is_some()
    }

    /// Race duration in seconds (completed races only)
    pub fn elapsed_seconds(&self) -> Option<f64> {
        if !self.completed() {
            return None;
        }
        let (start, end) = (self.starts_at?, self.completed_at?);
        Some((end - start).num_milliseconds() as f64 / 1000.0)
    }

    pub fn lane_of(&self, name: &str) -> Option<usize> {
        self.lanes.iter().position(|lane| lane == name)
    }

    pub fn winner_lane(&self) -> Option<usize> {
        self.winner_name.as_deref().and_then(|w| self.lane_of(w))
    }

    pub fn is_won_by(&self, name: &str) -> bool {
        self.winner_name.as_deref() == Some(name)
    }

    /// Best available point in time for this race
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.completed_at
            .or(self.starts_at)
            .or(self.event_starts_at)
    }

    pub fn involves(&self, name: &str) -> bool {
        self.lane_of(name).is_some()
    }
}

/// Lowercase and trim a mouse name
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn normalize_optional_name(name: &str) -> Option<String> {
    let name = normalize_name(name);
    if name.is_empty() || name == "null" || name == "none" {
        None
    } else {
        Some(name)
    }
}

/// Parse a feed timestamp (RFC 3339, or naive ISO-8601 taken as UTC)
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(ts.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_raw_race, ts};

    #[test]
    fn test_from_raw_normalizes_names() {
        let mut raw = create_raw_race("r1", ["Gold ", "TOAST", "bulp", "Mario"], 0, Some("Toast"));
        raw.runner_up_name = Some("null".to_string());

        let race = Race::from_raw(&raw).unwrap();

        assert_eq!(race.lanes, vec!["gold", "toast", "bulp", "mario"]);
        assert_eq!(race.winner_name.as_deref(), Some("toast"));
        assert_eq!(race.winner_lane(), Some(1));
        assert!(race.runner_up_name.is_none());
        assert!(race.completed());
        assert!(race.is_resolved());
    }

    #[test]
    fn test_elapsed_seconds() {
        let raw = create_raw_race("r1", ["a", "b", "c", "d"], 0, Some("a"));
        let race = Race::from_raw(&raw).unwrap();

        // Fixture races run 30.5 seconds
        assert!((race.elapsed_seconds().unwrap() - 30.5).abs() < 1e-9);
    }

    #[test]
    fn test_cancelled_race_not_completed() {
        let mut raw = create_raw_race("r1", ["a", "b", "c", "d"], 0, None);
        raw.race_cancelled = true;

        let race = Race::from_raw(&raw).unwrap();

        assert!(!race.completed());
        assert!(race.elapsed_seconds().is_none());
        assert!(race.winner_lane().is_none());
    }

    #[test]
    fn test_empty_lanes_rejected() {
        let mut raw = create_raw_race("r1", ["a", "b", "c", "d"], 0, None);
        raw.mice.clear();

        let err = Race::from_raw(&raw).unwrap_err();
        assert!(matches!(err, Error::MalformedRace { .. }));
    }

    #[test]
    fn test_winner_outside_lanes_rejected() {
        let raw = create_raw_race("r1", ["a", "b", "c", "d"], 0, Some("zeus"));
        let err = Race::from_raw(&raw).unwrap_err();
        assert!(err.to_string().contains("winner zeus"));
    }

    #[test]
    fn test_duplicate_lane_rejected() {
        let raw = create_raw_race("r1", ["a", "b", "A", "d"], 0, None);
        assert!(Race::from_raw(&raw).is_err());
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let mut raw = create_raw_race("r1", ["a", "b", "c", "d"], 0, Some("a"));
        raw.race_complete = Some("yesterday".to_string());

        let err = Race::from_raw(&raw).unwrap_err();
        assert!(err.to_string().contains("raceComplete"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = ts(0);
        assert_eq!(parse_timestamp("2019-05-01T12:00:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2019-05-01T12:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2019-05-01T14:00:00+02:00"), Some(expected));
        assert!(parse_timestamp("05/01/2019").is_none());
    }

    #[test]
    fn test_reference_time_falls_back() {
        let mut raw = create_raw_race("r1", ["a", "b", "c", "d"], 10, None);
        raw.race_complete = None;

        let race = Race::from_raw(&raw).unwrap();

        assert!(!race.completed());
        assert_eq!(race.reference_time(), race.starts_at);
    }
}
