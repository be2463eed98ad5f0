use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing::info;

mod config;
mod output;

use config::{Command, Config};
use winprob::db::load_match;
use winprob::db::models::{MatchRecording, UNKNOWN_MAP};
use winprob::stats::{build_feature_matrix, win_probability_with};

fn main() -> Result<()> {
    // Initialise tracing / logging (stderr, stdout carries the results)
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let demo = load_match(&config.match_path)
        .with_context(|| format!("Failed to load match from {}", config.match_path.display()))?;
    info!(
        "Match loaded: {} tick rows on {}",
        demo.ticks().len(),
        demo.map_name().unwrap_or(UNKNOWN_MAP)
    );

    let mut out: Box<dyn Write> = match &config.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output file {}", path.display())
        })?)),
        None => Box::new(io::stdout().lock()),
    };

    let ticks = config.command.ticks().to_vec();
    match &config.command {
        Command::Features { .. } => {
            let rows = build_feature_matrix(&demo, ticks)?;
            info!("Built {} feature row(s)", rows.len());
            output::write_records(&rows, config.format, &mut out)?;
        }
        Command::Predict { .. } => {
            let source = config.model_source();
            let probs = win_probability_with(&demo, ticks, &source)?;
            info!("Estimated win probability for {} tick(s)", probs.len());
            output::write_records(&probs, config.format, &mut out)?;
        }
    }
    out.flush()?;

    Ok(())
}
