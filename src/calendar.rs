//! Calendar helpers for daily price series
//!
//! Trading-day series skip weekends and holidays. Before a series is drawn as
//! a line coloured by day-over-day direction, each missing calendar day is
//! filled with a flat copy of the previous close.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1970, 1, 1) {
    Some(d) => d,
    None => panic!("epoch is a valid date"),
};

/// Whole days between 1970-01-01 and `date`.
pub fn days_since_epoch(date: NaiveDate) -> i64 {
    (date - EPOCH).num_days()
}

/// Inverse of [`days_since_epoch`].
pub fn date_from_epoch(days: i64) -> NaiveDate {
    EPOCH + chrono::Duration::days(days)
}

/// Fill every calendar gap in a strictly increasing daily series. Synthetic
/// days repeat the close of the trading day before them.
pub fn fill_gaps(dates: &[NaiveDate], closes: &[f64]) -> Result<(Vec<NaiveDate>, Vec<f64>)> {
    if dates.len() != closes.len() {
        return Err(Error::LengthMismatch {
            dates: dates.len(),
            closes: closes.len(),
        });
    }
    if let Some(pair) = dates.windows(2).find(|pair| pair[1] <= pair[0]) {
        return Err(Error::NonIncreasingDates {
            previous: pair[0],
            next: pair[1],
        });
    }

    let mut offsets: Vec<i64> = dates.iter().map(|d| days_since_epoch(*d)).collect();
    let mut values = closes.to_vec();

    let mut i = 0;
    while i + 1 < offsets.len() {
        if offsets[i + 1] != offsets[i] + 1 {
            offsets.insert(i + 1, offsets[i] + 1);
            values.insert(i + 1, values[i]);
        }
        i += 1;
    }

    Ok((offsets.into_iter().map(date_from_epoch).collect(), values))
}

/// `closes[i + 1] - closes[i]` for every adjacent pair.
pub fn day_over_day(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

/// Colour bucket of one line segment. A flat day lands in `Down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Trend::Up
        } else {
            Trend::Down
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Trend::Up => "green",
            Trend::Down => "red",
        }
    }
}

/// Daily closes keyed by calendar date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<f64>,
}

impl PriceSeries {
    pub fn new(dates: Vec<NaiveDate>, closes: Vec<f64>) -> Result<Self> {
        if dates.len() != closes.len() {
            return Err(Error::LengthMismatch {
                dates: dates.len(),
                closes: closes.len(),
            });
        }
        Ok(Self { dates, closes })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Gap-free copy of this series; `self` is left untouched.
    pub fn extended(&self) -> Result<PriceSeries> {
        let (dates, closes) = fill_gaps(&self.dates, &self.closes)?;
        Ok(PriceSeries { dates, closes })
    }

    /// Day-over-day trend of every segment, one shorter than the series.
    pub fn trends(&self) -> Vec<Trend> {
        day_over_day(&self.closes).into_iter().map(Trend::from_change).collect()
    }
}
