//! FSR recording import.
//!
//! Recordings are CSV files with a header row containing `time` (seconds)
//! and `force` columns. Header names are matched after trimming whitespace
//! and a leading byte-order mark; other columns are ignored.

use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use gait_core::Signal;

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        .ok_or_else(|| anyhow!("missing `{name}` column"))
}

/// Parse a recording from any CSV source
pub fn read_recording<R: Read>(reader: R) -> Result<Signal> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV header")?.clone();
    let time_col = column(&headers, "time")?;
    let force_col = column(&headers, "force")?;

    let mut time = Vec::new();
    let mut force = Vec::new();

    for (row, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV row {}", row + 1))?;

        let parse = |col: usize, name: &str| -> Result<f64> {
            record
                .get(col)
                .ok_or_else(|| anyhow!("row {}: missing {name}", row + 1))?
                .parse::<f64>()
                .with_context(|| format!("row {}: invalid {name}", row + 1))
        };

        time.push(parse(time_col, "time")?);
        force.push(parse(force_col, "force")?);
    }

    Ok(Signal::from_columns(&time, &force)?)
}

/// Load a recording from a CSV file
pub fn load_recording(path: &Path) -> Result<Signal> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let signal =
        read_recording(file).with_context(|| format!("Failed to load {}", path.display()))?;

    tracing::info!(path = %path.display(), samples = signal.len(), "Loaded recording");

    Ok(signal)
}
