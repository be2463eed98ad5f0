//! Round win probability per tick.
//!
//! The classifier answers one question, P(CT wins the round). The T side
//! gets the complement, so the two numbers always add up to one.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::features::{build_feature_matrix, TickSelection};
use crate::db::models::MatchRecording;
use crate::error::{Result, WinProbError};
use crate::model::{ModelArtifact, ModelSource};

/// Win probabilities for both sides at one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinProbability {
    pub tick: i64,
    #[serde(rename = "CT_win_probability")]
    pub ct_win_probability: f64,
    #[serde(rename = "T_win_probability")]
    pub t_win_probability: f64,
}

impl WinProbability {
    pub fn from_ct_probability(tick: i64, ct: f64) -> Self {
        WinProbability {
            tick,
            ct_win_probability: ct,
            t_win_probability: 1.0 - ct,
        }
    }
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Win probabilities for the requested ticks, using the model artifact at
/// its default location.
pub fn win_probability<M>(demo: &M, ticks: impl Into<TickSelection>) -> Result<Vec<WinProbability>>
where
    M: MatchRecording + ?Sized,
{
    win_probability_with(demo, ticks, &ModelArtifact::default())
}

/// Win probabilities for the requested ticks using an explicit model source.
///
/// Results follow the feature matrix order (ascending tick). The model is
/// loaded on every call. Any failure aborts the whole call; there are no
/// partial results.
pub fn win_probability_with<M>(
    demo: &M,
    ticks: impl Into<TickSelection>,
    source: &dyn ModelSource,
) -> Result<Vec<WinProbability>>
where
    M: MatchRecording + ?Sized,
{
    let rows = build_feature_matrix(demo, ticks)?;
    let classifier = source.load()?;
    let probs = classifier.predict_proba(&rows)?;

    if probs.len() != rows.len() {
        return Err(WinProbError::Inference(format!(
            "{} returned {} probabilities for {} rows",
            classifier.name(),
            probs.len(),
            rows.len()
        )));
    }
    if let Some(bad) = probs.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(WinProbError::Inference(format!(
            "{} returned probability {} outside [0, 1]",
            classifier.name(),
            bad
        )));
    }

    debug!(
        "Estimated win probability for {} tick(s) with {}",
        rows.len(),
        classifier.name()
    );
    Ok(rows
        .iter()
        .zip(probs)
        .map(|(row, p)| WinProbability::from_ct_probability(row.tick, p))
        .collect())
}
