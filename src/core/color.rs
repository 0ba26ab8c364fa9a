//! Mouse coat colors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Coat color reported by the leaderboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseColor {
    Brown,
    Black,
    #[serde(alias = "gray")]
    Grey,
    Yellow,
    White,
    Orange,
    Silver,
    Red,
}

impl MouseColor {
    /// Numeric code used in feature vectors (1-8)
    pub fn code(self) -> u8 {
        match self {
            MouseColor::Brown => 1,
            MouseColor::Black => 2,
            MouseColor::Grey => 3,
            MouseColor::Yellow => 4,
            MouseColor::White => 5,
            MouseColor::Orange => 6,
            MouseColor::Silver => 7,
            MouseColor::Red => 8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MouseColor::Brown => "brown",
            MouseColor::Black => "black",
            MouseColor::Grey => "grey",
            MouseColor::Yellow => "yellow",
            MouseColor::White => "white",
            MouseColor::Orange => "orange",
            MouseColor::Silver => "silver",
            MouseColor::Red => "red",
        }
    }
}

impl FromStr for MouseColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brown" => Ok(MouseColor::Brown),
            "black" => Ok(MouseColor::Black),
            "grey" | "gray" => Ok(MouseColor::Grey),
            "yellow" => Ok(MouseColor::Yellow),
            "white" => Ok(MouseColor::White),
            "orange" => Ok(MouseColor::Orange),
            "silver" => Ok(MouseColor::Silver),
            "red" => Ok(MouseColor::Red),
            _ => Err(Error::UnknownColor(s.to_string())),
        }
    }
}

impl fmt::Display for MouseColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
