//! Shared fixtures for unit tests

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use std::sync::Arc;

use crate::core::{Mouse, Race};
use crate::models::{MouseRecord, RawRace};

/// Fixture clock: 2019-05-01T12:00:00Z plus `minutes`
pub(crate) fn ts(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Feed record starting at `minutes` and finishing 30.5 seconds later
pub(crate) fn create_raw_race(
    id: &str,
    lanes: [&str; 4],
    minutes: i64,
    winner: Option<&str>,
) -> RawRace {
    let start = ts(minutes);
    RawRace {
        id: id.to_string(),
        mice: lanes.iter().map(|l| l.to_string()).collect(),
        event_start: Some(iso(start)),
        staging: None,
        betting_opens: None,
        race_starts: Some(iso(start)),
        race_complete: Some(iso(start + Duration::milliseconds(30_500))),
        race_is_reset: false,
        race_cancelled: false,
        winner_name: winner.map(|w| w.to_string()),
        runner_up_name: None,
    }
}

pub(crate) fn create_race(
    id: &str,
    lanes: [&str; 4],
    minutes: i64,
    winner: Option<&str>,
) -> Arc<Race> {
    Arc::new(Race::from_raw(&create_raw_race(id, lanes, minutes, winner)).unwrap())
}

pub(crate) fn create_mouse_record(name: &str, rating: f64) -> MouseRecord {
    MouseRecord {
        name: name.to_string(),
        family: "7".to_string(),
        rating,
        color: "brown".to_string(),
    }
}

pub(crate) fn create_mouse(name: &str) -> Mouse {
    Mouse::new(&create_mouse_record(name, 1500.0), 4).unwrap()
}

/// Leaderboard for the a/b/c/d fixture; b rates highest
pub(crate) fn create_abcd_records() -> Vec<MouseRecord> {
    vec![
        create_mouse_record("a", 1500.0),
        create_mouse_record("b", 1600.0),
        create_mouse_record("c", 1400.0),
        create_mouse_record("d", 1450.0),
    ]
}

/// Five races an hour apart.
///
/// `a` wins races 1, 3 and 5 from lane 0 and loses race 2 (lane 1) and
/// race 4 (lane 2). `b` wins race 2, `c` wins race 4, `d` never wins.
pub(crate) fn create_abcd_raw_races() -> Vec<RawRace> {
    vec![
        create_raw_race("r1", ["a", "b", "c", "d"], 0, Some("a")),
        create_raw_race("r2", ["b", "a", "c", "d"], 60, Some("b")),
        create_raw_race("r3", ["a", "c", "b", "d"], 120, Some("a")),
        create_raw_race("r4", ["c", "d", "a", "b"], 180, Some("c")),
        create_raw_race("r5", ["a", "d", "c", "b"], 240, Some("a")),
    ]
}

pub(crate) fn create_abcd_races() -> Vec<Arc<Race>> {
    create_abcd_raw_races()
        .iter()
        .map(|raw| Arc::new(Race::from_raw(raw).unwrap()))
        .collect()
}

/// Mouse whose history follows `pattern` (oldest first, 'W' = win, else loss),
/// one race every `spacing` minutes. Returns the mouse and the last race offset.
pub(crate) fn history_for(name: &str, pattern: &str, spacing: i64) -> (Mouse, i64) {
    let mut mouse = create_mouse(name);
    let mut offset = 0;
    for (i, c) in pattern.chars().enumerate() {
        offset = i as i64 * spacing;
        let winner = if c == 'W' { name } else { "b" };
        let race = create_race(&format!("h{}", i), [name, "b", "c", "d"], offset, Some(winner));
        mouse.append_race(race).unwrap();
    }
    (mouse, offset)
}
