//! Side-keyed estimator entry point that was never finished.
//!
//! Kept behind the `legacy` feature so downstream code written against it
//! still links; every call fails with `NotImplemented` and reads nothing.

use super::features::TickSelection;
use super::win_probability::WinProbability;
use crate::db::models::MatchRecording;
use crate::error::{Result, WinProbError};

pub fn win_probability<M>(_demo: &M, _ticks: impl Into<TickSelection>) -> Result<Vec<WinProbability>>
where
    M: MatchRecording + ?Sized,
{
    Err(WinProbError::NotImplemented(
        "side-keyed win probability; use stats::win_probability instead",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ParsedMatch;

    #[test]
    fn always_not_implemented() {
        let err = win_probability(&ParsedMatch::default(), 1000i64).unwrap_err();
        assert!(matches!(err, WinProbError::NotImplemented(_)));
    }
}
