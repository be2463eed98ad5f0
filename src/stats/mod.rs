pub mod features;
#[cfg(feature = "legacy")]
pub mod legacy;
pub mod win_probability;

pub use features::{build_feature_matrix, FeatureColumn, FeatureRow, TickSelection};
pub use win_probability::{win_probability, win_probability_with, WinProbability};
