//! Per-tick game state features.
//!
//! The parser hands us one row per (tick, player). Classifiers want one row
//! per tick, so this module collapses the long table into a wide one:
//! for each requested tick and each side, how many players are still alive
//! and what those alive players carry (health, equipment, armor, helmets).
//!
//! Dead players (health ≤ 0) never contribute to any aggregate, whatever the
//! rest of their row says.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::db::models::{MatchRecording, Side, TickRecord, UNKNOWN_MAP};
use crate::error::{Result, WinProbError};

/// Ticks to evaluate: either one tick or a list of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickSelection {
    Single(i64),
    Many(Vec<i64>),
}

impl TickSelection {
    pub fn into_vec(self) -> Vec<i64> {
        match self {
            TickSelection::Single(tick) => vec![tick],
            TickSelection::Many(ticks) => ticks,
        }
    }
}

impl From<i64> for TickSelection {
    fn from(tick: i64) -> Self {
        TickSelection::Single(tick)
    }
}

impl From<Vec<i64>> for TickSelection {
    fn from(ticks: Vec<i64>) -> Self {
        TickSelection::Many(ticks)
    }
}

impl From<&[i64]> for TickSelection {
    fn from(ticks: &[i64]) -> Self {
        TickSelection::Many(ticks.to_vec())
    }
}

impl<const N: usize> From<[i64; N]> for TickSelection {
    fn from(ticks: [i64; N]) -> Self {
        TickSelection::Many(ticks.to_vec())
    }
}

/// Game state at a single tick, one column per classifier input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub tick: i64,
    pub round: i32,
    pub map_name: String,
    pub bomb_planted: bool,
    pub players_alive_ct: u32,
    pub players_alive_t: u32,
    pub equipment_value_ct: i64,
    pub equipment_value_t: i64,
    pub hp_remaining_ct: i64,
    pub hp_remaining_t: i64,
    /// Alive players with armor above zero
    pub armor_ct: u32,
    pub armor_t: u32,
    /// Alive players wearing a helmet
    pub helmet_ct: u32,
    pub helmet_t: u32,
}

/// A numeric view of one `FeatureRow` field, as named in a model artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureColumn {
    Tick,
    Round,
    BombPlanted,
    PlayersAliveCt,
    PlayersAliveT,
    EquipmentValueCt,
    EquipmentValueT,
    HpRemainingCt,
    HpRemainingT,
    ArmorCt,
    ArmorT,
    HelmetCt,
    HelmetT,
    /// One-hot indicator: 1.0 when the row's map equals the given name.
    MapIs(String),
}

impl FromStr for FeatureColumn {
    type Err = WinProbError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(map) = s.strip_prefix("map_name=") {
            return Ok(FeatureColumn::MapIs(map.to_string()));
        }
        let column = match s {
            "tick" => FeatureColumn::Tick,
            "round" => FeatureColumn::Round,
            "bomb_planted" => FeatureColumn::BombPlanted,
            "players_alive_ct" => FeatureColumn::PlayersAliveCt,
            "players_alive_t" => FeatureColumn::PlayersAliveT,
            "equipment_value_ct" => FeatureColumn::EquipmentValueCt,
            "equipment_value_t" => FeatureColumn::EquipmentValueT,
            "hp_remaining_ct" => FeatureColumn::HpRemainingCt,
            "hp_remaining_t" => FeatureColumn::HpRemainingT,
            "armor_ct" => FeatureColumn::ArmorCt,
            "armor_t" => FeatureColumn::ArmorT,
            "helmet_ct" => FeatureColumn::HelmetCt,
            "helmet_t" => FeatureColumn::HelmetT,
            other => {
                return Err(WinProbError::Parse(format!("unknown feature column: {other}")))
            }
        };
        Ok(column)
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeatureColumn::Tick => "tick",
            FeatureColumn::Round => "round",
            FeatureColumn::BombPlanted => "bomb_planted",
            FeatureColumn::PlayersAliveCt => "players_alive_ct",
            FeatureColumn::PlayersAliveT => "players_alive_t",
            FeatureColumn::EquipmentValueCt => "equipment_value_ct",
            FeatureColumn::EquipmentValueT => "equipment_value_t",
            FeatureColumn::HpRemainingCt => "hp_remaining_ct",
            FeatureColumn::HpRemainingT => "hp_remaining_t",
            FeatureColumn::ArmorCt => "armor_ct",
            FeatureColumn::ArmorT => "armor_t",
            FeatureColumn::HelmetCt => "helmet_ct",
            FeatureColumn::HelmetT => "helmet_t",
            FeatureColumn::MapIs(map) => return write!(f, "map_name={map}"),
        };
        f.write_str(name)
    }
}

impl FeatureRow {
    /// Numeric value of one column; booleans map to 0.0 / 1.0.
    pub fn column(&self, column: &FeatureColumn) -> f64 {
        match column {
            FeatureColumn::Tick => self.tick as f64,
            FeatureColumn::Round => self.round as f64,
            FeatureColumn::BombPlanted => bool_value(self.bomb_planted),
            FeatureColumn::PlayersAliveCt => self.players_alive_ct as f64,
            FeatureColumn::PlayersAliveT => self.players_alive_t as f64,
            FeatureColumn::EquipmentValueCt => self.equipment_value_ct as f64,
            FeatureColumn::EquipmentValueT => self.equipment_value_t as f64,
            FeatureColumn::HpRemainingCt => self.hp_remaining_ct as f64,
            FeatureColumn::HpRemainingT => self.hp_remaining_t as f64,
            FeatureColumn::ArmorCt => self.armor_ct as f64,
            FeatureColumn::ArmorT => self.armor_t as f64,
            FeatureColumn::HelmetCt => self.helmet_ct as f64,
            FeatureColumn::HelmetT => self.helmet_t as f64,
            FeatureColumn::MapIs(map) => bool_value(self.map_name == *map),
        }
    }
}

fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

// ── Aggregation ──────────────────────────────────────────────────────────────

/// Running totals for the alive players of one side at one tick.
#[derive(Debug, Default)]
struct SideTotals {
    players: HashSet<u64>,
    equipment_value: i64,
    hp_remaining: i64,
    armored: u32,
    helmets: u32,
}

impl SideTotals {
    /// Sums run over every alive row; player counts (alive, armored,
    /// helmeted) only count a steamid the first time it is seen.
    fn add(&mut self, rec: &TickRecord) {
        let first_sighting = self.players.insert(rec.steamid);
        self.equipment_value += rec.current_equip_value;
        self.hp_remaining += i64::from(rec.health);
        if !first_sighting {
            return;
        }
        if rec.armor() > 0 {
            self.armored += 1;
        }
        if rec.helmet() {
            self.helmets += 1;
        }
    }

    fn players_alive(&self) -> u32 {
        self.players.len() as u32
    }
}

/// Everything collected for one tick. Round and bomb state are taken from
/// the first row seen; both are constant within a tick.
#[derive(Debug)]
struct TickTotals {
    round: i32,
    bomb_planted: bool,
    ct: SideTotals,
    t: SideTotals,
}

impl TickTotals {
    fn new(first: &TickRecord) -> Self {
        TickTotals {
            round: first.round,
            bomb_planted: first.is_bomb_planted,
            ct: SideTotals::default(),
            t: SideTotals::default(),
        }
    }

    fn add(&mut self, rec: &TickRecord) {
        if !rec.is_alive() {
            return;
        }
        match rec.side {
            Side::Ct => self.ct.add(rec),
            Side::Terrorist => self.t.add(rec),
        }
    }

    fn into_row(self, tick: i64, map_name: &str) -> FeatureRow {
        FeatureRow {
            tick,
            round: self.round,
            map_name: map_name.to_string(),
            bomb_planted: self.bomb_planted,
            players_alive_ct: self.ct.players_alive(),
            players_alive_t: self.t.players_alive(),
            equipment_value_ct: self.ct.equipment_value,
            equipment_value_t: self.t.equipment_value,
            hp_remaining_ct: self.ct.hp_remaining,
            hp_remaining_t: self.t.hp_remaining,
            armor_ct: self.ct.armored,
            armor_t: self.t.armored,
            helmet_ct: self.ct.helmets,
            helmet_t: self.t.helmets,
        }
    }
}

/// Build one feature row per requested tick that exists in the match.
///
/// Rows come back in ascending tick order. Requested ticks with no telemetry
/// are skipped; only an entirely empty selection is an error.
///
/// # Errors
/// * `EmptyInput` – the match carries no telemetry at all.
/// * `NoMatchingTicks` – none of the requested ticks exist.
pub fn build_feature_matrix<M>(demo: &M, ticks: impl Into<TickSelection>) -> Result<Vec<FeatureRow>>
where
    M: MatchRecording + ?Sized,
{
    let records = demo.ticks();
    if records.is_empty() {
        return Err(WinProbError::EmptyInput);
    }

    let requested = ticks.into().into_vec();
    let wanted: HashSet<i64> = requested.iter().copied().collect();

    let mut by_tick: BTreeMap<i64, TickTotals> = BTreeMap::new();
    for rec in records.iter().filter(|r| wanted.contains(&r.tick)) {
        by_tick
            .entry(rec.tick)
            .or_insert_with(|| TickTotals::new(rec))
            .add(rec);
    }

    if by_tick.is_empty() {
        return Err(WinProbError::NoMatchingTicks { requested });
    }

    let map_name = demo.map_name().unwrap_or(UNKNOWN_MAP);
    let rows: Vec<FeatureRow> = by_tick
        .into_iter()
        .map(|(tick, totals)| totals.into_row(tick, map_name))
        .collect();

    debug!(
        "Built {} feature row(s) for {} requested tick(s)",
        rows.len(),
        requested.len()
    );
    Ok(rows)
}
