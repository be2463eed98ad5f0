//! CS2 round win probability from parsed match telemetry.
//!
//! Two stages run back to back: [`stats::build_feature_matrix`] collapses the
//! per-player, per-tick telemetry of a parsed match into one game-state row
//! per tick, and [`stats::win_probability`] feeds those rows to a pre-trained
//! classifier and reports P(CT wins) and P(T wins) for each tick.

pub mod db;
pub mod error;
pub mod model;
pub mod stats;

pub use db::models::{MatchHeader, MatchRecording, ParsedMatch, Side, TickRecord};
pub use error::{Result, WinProbError};
pub use stats::{
    build_feature_matrix, win_probability, win_probability_with, FeatureRow, TickSelection,
    WinProbability,
};
