use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;

/// Tabular output encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON array, one object per tick
    Json,
    /// CSV with a header row
    Csv,
}

/// Write one record per tick in the requested format
pub fn write_records<T, W>(records: &[T], format: OutputFormat, mut out: W) -> Result<()>
where
    T: Serialize,
    W: Write,
{
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, records)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            for record in records {
                wtr.serialize(record)?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}
