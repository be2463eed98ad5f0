//! Gradient-boosted decision trees.
//!
//! Every tree maps a row to a leaf value; the leaf values of all trees are
//! summed with `base_score` into a log-odds margin, and the margin goes
//! through a sigmoid. Nodes live in a flat array with the root at index 0.
//! Children always sit at a higher index than their parent, which the
//! artifact loader checks, so a walk always reaches a leaf.

use serde::{Deserialize, Serialize};

use super::calibration::sigmoid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        /// Taken when `value < threshold`
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Structural problems, if any, for a model with `num_features` columns
    pub fn validate(&self, num_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= num_features {
                    return Err(format!(
                        "node {idx} splits on feature {feature}, model has {num_features}"
                    ));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!("node {idx} has invalid child {child}"));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn leaf_value(&self, values: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { leaf } => return *leaf,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if values[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn validate(&self, num_features: usize) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("ensemble has no trees".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(num_features)
                .map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }

    pub fn margin(&self, values: &[f64]) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.leaf_value(values)).sum::<f64>()
    }

    pub fn predict(&self, values: &[f64]) -> f64 {
        sigmoid(self.margin(values))
    }
}
