//! CSV persistence for filtered submissions and cached daily bars

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::filter::FilteredSubmission;
use crate::stocks::Bar;

/// On-disk row. `tickers` holds a JSON array so the list round-trips intact.
#[derive(Debug, Serialize, Deserialize)]
struct SubmissionRow {
    title: String,
    selftext: String,
    time: DateTime<Utc>,
    tickers: String,
}

impl TryFrom<&FilteredSubmission> for SubmissionRow {
    type Error = Error;

    fn try_from(sub: &FilteredSubmission) -> Result<Self> {
        Ok(SubmissionRow {
            title: sub.title.clone(),
            selftext: sub.body.clone(),
            time: sub.created_at,
            tickers: serde_json::to_string(&sub.tickers)?,
        })
    }
}

impl TryFrom<SubmissionRow> for FilteredSubmission {
    type Error = Error;

    fn try_from(row: SubmissionRow) -> Result<Self> {
        Ok(FilteredSubmission {
            title: row.title,
            body: row.selftext,
            created_at: row.time,
            tickers: serde_json::from_str(&row.tickers)?,
        })
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn write_filtered(path: &Path, subs: &[FilteredSubmission]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for sub in subs {
        writer.serialize(SubmissionRow::try_from(sub)?)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = subs.len(), "wrote filtered submissions");
    Ok(())
}

pub fn read_filtered(path: &Path) -> Result<Vec<FilteredSubmission>> {
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize::<SubmissionRow>()
        .map(|row| FilteredSubmission::try_from(row?))
        .collect()
}

/// Cached bar file for `ticker` under `data_dir`.
pub fn bars_path(data_dir: &Path, ticker: &str) -> PathBuf {
    data_dir.join(format!("{ticker}data.csv"))
}

pub fn write_bars(path: &Path, bars: &[Bar]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for bar in bars {
        writer.serialize(bar)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = bars.len(), "wrote bars");
    Ok(())
}

pub fn read_bars(path: &Path) -> Result<Vec<Bar>> {
    let mut reader = csv::Reader::from_path(path)?;
    let bars = reader.deserialize().collect::<std::result::Result<Vec<Bar>, _>>()?;
    Ok(bars)
}

#[derive(Debug, Deserialize)]
struct IndexMember {
    #[serde(rename = "Symbol")]
    symbol: String,
}

/// Symbols from an index membership CSV with a `Symbol` column.
pub fn read_index_symbols(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut symbols = Vec::new();
    for row in reader.deserialize::<IndexMember>() {
        symbols.push(row?.symbol);
    }
    Ok(symbols)
}
