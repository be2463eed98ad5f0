use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WinProbError;

/// Map name reported when the match header carries none.
pub const UNKNOWN_MAP: &str = "unknown";

/// Team side within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    #[serde(rename = "CT")]
    Ct,
    #[serde(rename = "TERRORIST")]
    Terrorist,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Ct => "CT",
            Side::Terrorist => "TERRORIST",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = WinProbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CT" => Ok(Side::Ct),
            "TERRORIST" | "T" => Ok(Side::Terrorist),
            other => Err(WinProbError::Parse(format!("unknown side: {:?}", other))),
        }
    }
}

impl<'de> Deserialize<'de> for Side {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One player's state at one tick, as emitted by the demo parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub tick: i64,
    pub round: i32,
    /// Older parser exports name this column `team_name`
    #[serde(alias = "team_name")]
    pub side: Side,
    pub health: i32,
    #[serde(default)]
    pub armor_value: Option<i32>,
    #[serde(default)]
    pub has_helmet: Option<bool>,
    pub current_equip_value: i64,
    pub is_bomb_planted: bool,
    pub steamid: u64,
}

impl TickRecord {
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Armor points; 0 when the parser did not export armor
    pub fn armor(&self) -> i32 {
        self.armor_value.unwrap_or(0)
    }

    /// Helmet flag; false when the parser did not export helmets
    pub fn helmet(&self) -> bool {
        self.has_helmet.unwrap_or(false)
    }
}

/// Match-wide metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchHeader {
    #[serde(default)]
    pub map_name: Option<String>,
}

/// A fully parsed match recording
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedMatch {
    #[serde(default)]
    pub header: MatchHeader,
    #[serde(default)]
    pub ticks: Vec<TickRecord>,
}

/// Read-only view over a parsed match. Implemented by whatever owns the
/// parser output; the feature extractor only ever reads through this trait.
pub trait MatchRecording {
    /// Every per-player, per-tick telemetry row.
    fn ticks(&self) -> &[TickRecord];

    /// Map the match was played on, if the header has one.
    fn map_name(&self) -> Option<&str>;
}

impl MatchRecording for ParsedMatch {
    fn ticks(&self) -> &[TickRecord] {
        &self.ticks
    }

    fn map_name(&self) -> Option<&str> {
        self.header.map_name.as_deref()
    }
}
