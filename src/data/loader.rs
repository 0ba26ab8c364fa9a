//! Feed loading
//!
//! Reads race and leaderboard dumps from disk. Race dumps come in three
//! shapes: a plain list, one API page (`{"games": [...], "total": n}`), or an
//! object keyed by race id.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::models::{MouseRecord, RawRace};

#[derive(Deserialize)]
#[serde(untagged)]
enum RaceFeed {
    List(Vec<RawRace>),
    Page {
        games: Vec<RawRace>,
        #[allow(dead_code)]
        #[serde(default)]
        total: Option<u64>,
    },
    Keyed(BTreeMap<String, RawRace>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MouseFeed {
    List(Vec<MouseRecord>),
    Wrapped { data: Vec<MouseRecord> },
}

/// Parse a race dump; repeated ids keep the last record
pub fn parse_races(json: &str) -> Result<Vec<RawRace>> {
    let races = match serde_json::from_str::<RaceFeed>(json)? {
        RaceFeed::List(races) | RaceFeed::Page { games: races, .. } => races,
        RaceFeed::Keyed(map) => map.into_values().collect(),
    };
    Ok(dedup_by_id(races))
}

pub fn load_races<P: AsRef<Path>>(path: P) -> Result<Vec<RawRace>> {
    let races = parse_races(&fs::read_to_string(path.as_ref())?)?;
    info!("Loaded {} races from {}", races.len(), path.as_ref().display());
    Ok(races)
}

/// Parse a leaderboard dump (list or `{"data": [...]}`)
pub fn parse_mice(json: &str) -> Result<Vec<MouseRecord>> {
    Ok(match serde_json::from_str::<MouseFeed>(json)? {
        MouseFeed::List(mice) | MouseFeed::Wrapped { data: mice } => mice,
    })
}

pub fn load_mice<P: AsRef<Path>>(path: P) -> Result<Vec<MouseRecord>> {
    let mice = parse_mice(&fs::read_to_string(path.as_ref())?)?;
    info!("Loaded {} mice from {}", mice.len(), path.as_ref().display());
    Ok(mice)
}

fn dedup_by_id(races: Vec<RawRace>) -> Vec<RawRace> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(races.len());
    let mut unique: Vec<RawRace> = Vec::with_capacity(races.len());

    for race in races {
        match positions.get(&race.id) {
            Some(&idx) => unique[idx] = race,
            None => {
                positions.insert(race.id.clone(), unique.len());
                unique.push(race);
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Write;

    const RACE: &str = r#"{"_id": "r1", "mice": ["a", "b", "c", "d"], "winnerName": "a",
        "raceStarts": "2019-05-01T12:00:00.000Z", "raceComplete": "2019-05-01T12:00:30.500Z"}"#;

    #[test]
    fn test_parse_race_list() {
        let races = parse_races(&format!("[{}]", RACE)).unwrap();
        assert_eq!(races.len(), 1);
        assert_eq!(races[0].id, "r1");
    }

    #[test]
    fn test_parse_race_page() {
        let races = parse_races(&format!(r#"{{"games": [{}], "total": 1}}"#, RACE)).unwrap();
        assert_eq!(races.len(), 1);
    }

    #[test]
    fn test_parse_keyed_races() {
        let json = format!(r#"{{"r1": {}}}"#, RACE);
        let races = parse_races(&json).unwrap();
        assert_eq!(races[0].winner_name.as_deref(), Some("a"));
    }

    #[test]
    fn test_duplicate_ids_keep_last() {
        let second = RACE.replace(r#""winnerName": "a""#, r#""winnerName": "b""#);
        let json = format!(
            r#"[{}, {}, {}]"#,
            RACE,
            RACE.replace("r1", "r2"),
            second
        );

        let races = parse_races(&json).unwrap();
        assert_eq!(races.len(), 2);
        assert_eq!(races[0].id, "r1");
        assert_eq!(races[0].winner_name.as_deref(), Some("b"));
        assert_eq!(races[1].id, "r2");
    }

    #[test]
    fn test_parse_mice_shapes() {
        let record = r#"{"name": "Gold", "family": "3", "rating": 1500.0, "color": "brown"}"#;

        assert_eq!(parse_mice(&format!("[{}]", record)).unwrap().len(), 1);
        assert_eq!(
            parse_mice(&format!(r#"{{"data": [{}]}}"#, record))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(parse_races("{not json"), Err(Error::Json(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{}]", RACE).unwrap();

        let races = load_races(file.path()).unwrap();
        assert_eq!(races.len(), 1);

        assert!(matches!(
            load_races(file.path().with_extension("missing")),
            Err(Error::Io(_))
        ));
    }
}
