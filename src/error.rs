use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building features or estimating win probabilities.
#[derive(Debug, Error)]
pub enum WinProbError {
    #[error("Match does not contain tick data")]
    EmptyInput,

    #[error("No data found for specified ticks: {requested:?}")]
    NoMatchingTicks { requested: Vec<i64> },

    #[error(
        "Win probability model unavailable at {}: {}. \
         Download the trained model artifact and place it at that path, \
         or point --model-path / WIN_PROB_MODEL_PATH at a local copy",
        path.display(),
        reason
    )]
    ModelUnavailable { path: PathBuf, reason: String },

    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Classifier output invalid: {0}")]
    Inference(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, WinProbError>;

impl WinProbError {
    pub(crate) fn model_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        WinProbError::ModelUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_unavailable_message_explains_remediation() {
        let err = WinProbError::model_unavailable("/opt/winprob/data/model.json", "not found");
        let msg = err.to_string();
        assert!(msg.contains("/opt/winprob/data/model.json"));
        assert!(msg.contains("not found"));
        assert!(msg.contains("Download the trained model artifact"));
    }

    #[test]
    fn no_matching_ticks_lists_request() {
        let err = WinProbError::NoMatchingTicks {
            requested: vec![9_999_999],
        };
        assert!(err.to_string().contains("9999999"));
    }
}
