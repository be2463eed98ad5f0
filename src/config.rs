use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;
use winprob::model::ModelArtifact;

/// CS2 round win probability from parsed match telemetry
#[derive(Parser, Debug, Clone)]
#[command(name = "winprob", version, about)]
pub struct Config {
    /// Parsed match: JSON, or a SQLite export (.db / .sqlite / .sqlite3)
    #[arg(long, env = "MATCH_PATH")]
    pub match_path: PathBuf,

    /// Trained model artifact (defaults to the copy installed with the crate)
    #[arg(long, env = "WIN_PROB_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Output encoding
    #[arg(long, env = "OUTPUT_FORMAT", value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Write results to this file instead of stdout
    #[arg(long, env = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the per-tick game state feature matrix
    Features {
        /// Comma-separated ticks, e.g. 1000,1064,1128
        #[arg(long, value_delimiter = ',', required = true)]
        ticks: Vec<i64>,
    },
    /// Print CT and T round win probabilities per tick
    Predict {
        /// Comma-separated ticks, e.g. 1000,1064,1128
        #[arg(long, value_delimiter = ',', required = true)]
        ticks: Vec<i64>,
    },
}

impl Command {
    pub fn ticks(&self) -> &[i64] {
        match self {
            Command::Features { ticks } | Command::Predict { ticks } => ticks,
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.match_path.is_file() {
            anyhow::bail!("match file not found: {}", self.match_path.display());
        }
        if self.command.ticks().is_empty() {
            anyhow::bail!("at least one tick must be requested with --ticks");
        }
        if let Some(path) = &self.model_path {
            if path.is_dir() {
                anyhow::bail!(
                    "--model-path must point at the artifact file, got directory {}",
                    path.display()
                );
            }
        }
        Ok(())
    }

    pub fn model_source(&self) -> ModelArtifact {
        match &self.model_path {
            Some(path) => ModelArtifact::new(path.clone()),
            None => ModelArtifact::default(),
        }
    }
}
