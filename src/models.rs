use serde::{Deserialize, Deserializer, Serialize};

/// Race record as delivered by the race feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawRace {
    #[serde(rename = "_id")]
    pub id: String,
    /// Lane order matters: index = lane
    pub mice: Vec<String>,
    #[serde(default)]
    pub event_start: Option<String>,
    #[serde(default)]
    pub staging: Option<String>,
    #[serde(default)]
    pub betting_opens: Option<String>,
    #[serde(default)]
    pub race_starts: Option<String>,
    #[serde(default)]
    pub race_complete: Option<String>,
    #[serde(default)]
    pub race_is_reset: bool,
    #[serde(default)]
    pub race_cancelled: bool,
    #[serde(default)]
    pub winner_name: Option<String>,
    #[serde(default)]
    pub runner_up_name: Option<String>,
}

/// Mouse metadata from the leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MouseRecord {
    pub name: String,
    /// Digits only; the leaderboard sends it as a string, older dumps as a number
    #[serde(deserialize_with = "string_or_number")]
    pub family: String,
    pub rating: f64,
    pub color: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Family {
        Text(String),
        Number(u64),
    }

    Ok(match Family::deserialize(deserializer)? {
        Family::Text(text) => text,
        Family::Number(n) => n.to_string(),
    })
}
