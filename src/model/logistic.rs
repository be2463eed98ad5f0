//! Logistic regression over the feature columns.
//!
//! ```text
//! P(CT wins) = sigmoid(intercept + Σ coefficient[i] × column[i])
//! ```

use serde::{Deserialize, Serialize};

use super::calibration::sigmoid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    /// One weight per artifact feature, in artifact column order
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl LogisticModel {
    pub fn num_features(&self) -> usize {
        self.coefficients.len()
    }

    /// Raw probability for one row of column values
    pub fn predict(&self, values: &[f64]) -> f64 {
        let z: f64 = self
            .coefficients
            .iter()
            .zip(values)
            .map(|(w, x)| w * x)
            .sum();
        sigmoid(self.intercept + z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_weights_give_intercept_probability() {
        let m = LogisticModel {
            coefficients: vec![0.0, 0.0],
            intercept: 0.0,
        };
        assert_relative_eq!(m.predict(&[3.0, 5.0]), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn positive_weight_raises_probability() {
        let m = LogisticModel {
            coefficients: vec![0.8],
            intercept: -0.2,
        };
        assert!(m.predict(&[2.0]) > m.predict(&[1.0]));
        assert_relative_eq!(m.predict(&[0.25]), 0.5, epsilon = 1e-12);
    }
}
