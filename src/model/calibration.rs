//! Probability calibration (Platt scaling) applied on top of a classifier.
//!
//! The model is `p_calibrated = sigmoid(a * logit(p_raw) + b)`. Parameters
//! are fitted offline together with the classifier and shipped inside the
//! model artifact.

use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattCalibration {
    pub a: f64,
    pub b: f64,
}

impl Default for PlattCalibration {
    /// The identity mapping (up to clamping at the extremes)
    fn default() -> Self {
        PlattCalibration { a: 1.0, b: 0.0 }
    }
}

fn clamp_prob(p: f64) -> f64 {
    p.clamp(EPS, 1.0 - EPS)
}

pub(crate) fn logit(p: f64) -> f64 {
    let p = clamp_prob(p);
    (p / (1.0 - p)).ln()
}

/// Numerically stable logistic function
pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// Map a classifier's raw P(CT wins) through the artifact's `calibration`
/// block. Output is clamped to [0, 1].
pub fn apply_platt(raw_prob: f64, model: PlattCalibration) -> f64 {
    let x = logit(raw_prob);
    sigmoid(model.a * x + model.b).clamp(0.0, 1.0)
}
