//! Pre-trained round-outcome classifiers.
//!
//! The estimator only sees the [`Classifier`] trait: N feature rows in,
//! N probabilities that the CT side wins out. How the model was trained or
//! serialized stays behind [`ModelSource`].
//!
//! The shipped artifact is a JSON document:
//!
//! ```text
//! {
//!   "format_version": 1,
//!   "name": "cs2-round-winprob",
//!   "feature_names": ["bomb_planted", "players_alive_ct", "map_name=de_dust2", ...],
//!   "model": { "kind": "logistic", "coefficients": [...], "intercept": 0.0 },
//!   "calibration": { "a": 1.0, "b": 0.0 }        (optional)
//! }
//! ```
//!
//! `feature_names` fixes the column order the model was trained with.

pub mod calibration;
pub mod logistic;
pub mod trees;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, WinProbError};
use crate::stats::features::{FeatureColumn, FeatureRow};

pub use calibration::{apply_platt, PlattCalibration};
pub use logistic::LogisticModel;
pub use trees::{Node, Tree, TreeEnsemble};

/// Artifact layout version this build understands
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Where the trained artifact lives, next to the crate sources
pub const DEFAULT_MODEL_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/data/win_prob_model.json");

/// A binary classifier whose positive class is "CT wins the round".
pub trait Classifier: Send + Sync {
    /// One probability per row, in row order.
    fn predict_proba(&self, rows: &[FeatureRow]) -> Result<Vec<f64>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Anything that can produce a ready classifier on demand.
pub trait ModelSource {
    fn load(&self) -> Result<Box<dyn Classifier>>;
}

/// On-disk artifact contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub format_version: u32,
    #[serde(default = "default_model_name")]
    pub name: String,
    pub feature_names: Vec<String>,
    pub model: ModelKind,
    #[serde(default)]
    pub calibration: Option<PlattCalibration>,
}

fn default_model_name() -> String {
    "win-probability".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelKind {
    Logistic(LogisticModel),
    GradientBoostedTrees(TreeEnsemble),
}

/// A validated artifact, ready for inference
#[derive(Debug, Clone)]
pub struct TrainedClassifier {
    name: String,
    columns: Vec<FeatureColumn>,
    model: ModelKind,
    calibration: Option<PlattCalibration>,
}

impl TrainedClassifier {
    /// Check the artifact against this build and resolve its column names.
    pub fn from_artifact(artifact: ArtifactFile) -> std::result::Result<Self, String> {
        if artifact.format_version != MODEL_FORMAT_VERSION {
            return Err(format!(
                "unsupported format_version {} (expected {})",
                artifact.format_version, MODEL_FORMAT_VERSION
            ));
        }
        if artifact.feature_names.is_empty() {
            return Err("artifact lists no features".into());
        }
        let columns = artifact
            .feature_names
            .iter()
            .map(|name| name.parse::<FeatureColumn>().map_err(|e| e.to_string()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        match &artifact.model {
            ModelKind::Logistic(m) => {
                if m.num_features() != columns.len() {
                    return Err(format!(
                        "{} coefficients for {} features",
                        m.num_features(),
                        columns.len()
                    ));
                }
            }
            ModelKind::GradientBoostedTrees(e) => e.validate(columns.len())?,
        }

        Ok(TrainedClassifier {
            name: artifact.name,
            columns,
            model: artifact.model,
            calibration: artifact.calibration,
        })
    }

    pub fn num_features(&self) -> usize {
        self.columns.len()
    }

    fn predict_row(&self, row: &FeatureRow) -> f64 {
        let values: Vec<f64> = self.columns.iter().map(|c| row.column(c)).collect();
        let raw = match &self.model {
            ModelKind::Logistic(m) => m.predict(&values),
            ModelKind::GradientBoostedTrees(e) => e.predict(&values),
        };
        match self.calibration {
            Some(cal) => apply_platt(raw, cal),
            None => raw,
        }
    }
}

impl Classifier for TrainedClassifier {
    fn predict_proba(&self, rows: &[FeatureRow]) -> Result<Vec<f64>> {
        Ok(rows.iter().map(|row| self.predict_row(row)).collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Model artifact on the local filesystem. Read afresh on every `load`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifact {
    path: PathBuf,
}

impl ModelArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ModelArtifact { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ModelArtifact {
    fn default() -> Self {
        ModelArtifact::new(DEFAULT_MODEL_PATH)
    }
}

impl ModelSource for ModelArtifact {
    fn load(&self) -> Result<Box<dyn Classifier>> {
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| WinProbError::model_unavailable(&self.path, e))?;
        let artifact: ArtifactFile = serde_json::from_str(&raw).map_err(|e| {
            WinProbError::model_unavailable(&self.path, format!("malformed artifact: {e}"))
        })?;
        let classifier = TrainedClassifier::from_artifact(artifact).map_err(|e| {
            WinProbError::model_unavailable(&self.path, format!("invalid artifact: {e}"))
        })?;
        info!(
            "Loaded win probability model '{}' ({} features) from {}",
            classifier.name(),
            classifier.num_features(),
            self.path.display()
        );
        Ok(Box::new(classifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    fn row(players_alive_ct: u32, players_alive_t: u32, map_name: &str) -> FeatureRow {
        FeatureRow {
            tick: 1000,
            round: 3,
            map_name: map_name.to_string(),
            bomb_planted: false,
            players_alive_ct,
            players_alive_t,
            equipment_value_ct: 0,
            equipment_value_t: 0,
            hp_remaining_ct: 0,
            hp_remaining_t: 0,
            armor_ct: 0,
            armor_t: 0,
            helmet_ct: 0,
            helmet_t: 0,
        }
    }

    fn logistic_artifact() -> ArtifactFile {
        ArtifactFile {
            format_version: MODEL_FORMAT_VERSION,
            name: "test-logistic".into(),
            feature_names: vec![
                "players_alive_ct".into(),
                "players_alive_t".into(),
                "map_name=de_nuke".into(),
            ],
            model: ModelKind::Logistic(LogisticModel {
                coefficients: vec![0.5, -0.5, 0.3],
                intercept: 0.0,
            }),
            calibration: None,
        }
    }

    fn write_artifact(dir: &Path, artifact: &ArtifactFile) -> PathBuf {
        let path = dir.join("model.json");
        std::fs::write(&path, serde_json::to_string_pretty(artifact).unwrap()).unwrap();
        path
    }

    #[test]
    fn logistic_artifact_predicts_in_column_order() {
        let clf = TrainedClassifier::from_artifact(logistic_artifact()).unwrap();
        let probs = clf
            .predict_proba(&[row(5, 5, "de_mirage"), row(5, 3, "de_mirage"), row(5, 5, "de_nuke")])
            .unwrap();
        assert_eq!(probs.len(), 3);
        assert_relative_eq!(probs[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(probs[1], calibration::sigmoid(1.0), epsilon = 1e-12);
        assert_relative_eq!(probs[2], calibration::sigmoid(0.3), epsilon = 1e-12);
    }

    #[test]
    fn calibration_is_applied_after_model() {
        let mut artifact = logistic_artifact();
        let cal = PlattCalibration { a: 0.5, b: 0.1 };
        artifact.calibration = Some(cal);
        let clf = TrainedClassifier::from_artifact(artifact).unwrap();
        let p = clf.predict_proba(&[row(5, 3, "de_mirage")]).unwrap()[0];
        let raw = calibration::sigmoid(1.0);
        assert_relative_eq!(p, apply_platt(raw, cal), epsilon = 1e-12);
    }

    #[test]
    fn tree_artifact_loads_from_json() {
        let json = r#"{
            "format_version": 1,
            "name": "test-gbt",
            "feature_names": ["players_alive_ct", "bomb_planted"],
            "model": {
                "kind": "gradient_boosted_trees",
                "base_score": 0.0,
                "trees": [
                    {"nodes": [
                        {"feature": 1, "threshold": 0.5, "left": 1, "right": 2},
                        {"leaf": 0.4},
                        {"leaf": -0.6}
                    ]}
                ]
            }
        }"#;
        let dir = tempdir().unwrap();
        let path = dir.path().join("gbt.json");
        std::fs::write(&path, json).unwrap();

        let clf = ModelArtifact::new(&path).load().unwrap();
        assert_eq!(clf.name(), "test-gbt");
        let mut planted = row(2, 2, "de_dust2");
        planted.bomb_planted = true;
        let probs = clf.predict_proba(&[row(2, 2, "de_dust2"), planted]).unwrap();
        assert_relative_eq!(probs[0], calibration::sigmoid(0.4), epsilon = 1e-12);
        assert_relative_eq!(probs[1], calibration::sigmoid(-0.6), epsilon = 1e-12);
    }

    #[test]
    fn artifact_file_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = write_artifact(dir.path(), &logistic_artifact());
        let clf = ModelArtifact::new(path).load().unwrap();
        assert_eq!(clf.name(), "test-logistic");
    }

    #[test]
    fn missing_artifact_is_model_unavailable() {
        let dir = tempdir().unwrap();
        let err = ModelArtifact::new(dir.path().join("absent.json"))
            .load()
            .err()
            .unwrap();
        assert!(matches!(err, WinProbError::ModelUnavailable { .. }));
        assert!(err.to_string().contains("Download the trained model artifact"));
    }

    #[test]
    fn malformed_artifact_is_model_unavailable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{\"format_version\": 1}").unwrap();
        let err = ModelArtifact::new(&path).load().err().unwrap();
        assert!(matches!(err, WinProbError::ModelUnavailable { .. }));
    }

    #[test]
    fn unknown_feature_or_wrong_shape_is_rejected() {
        let mut artifact = logistic_artifact();
        artifact.feature_names[0] = "kills_ct".into();
        assert!(TrainedClassifier::from_artifact(artifact).is_err());

        let mut artifact = logistic_artifact();
        artifact.feature_names.pop();
        assert!(TrainedClassifier::from_artifact(artifact).is_err());

        let mut artifact = logistic_artifact();
        artifact.format_version = 2;
        let err = TrainedClassifier::from_artifact(artifact).unwrap_err();
        assert!(err.contains("format_version"));
    }

    #[test]
    fn default_location_is_inside_crate() {
        let artifact = ModelArtifact::default();
        assert!(artifact.path().ends_with("data/win_prob_model.json"));
    }
}
