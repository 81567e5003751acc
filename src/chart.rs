//! Chart data handed to an external plotter as JSON
//!
//! Nothing here draws pixels. Each type carries exactly what a renderer needs:
//! a two-colour price line, a grouped bar chart, or several plain lines.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::calendar::{PriceSeries, Trend};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub start_close: f64,
    pub end_close: f64,
    pub trend: Trend,
}

/// Price line whose segments are coloured by day-over-day direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColoredLine {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: PriceSeries,
    pub segments: Vec<Segment>,
}

impl ColoredLine {
    /// Gap-fill `series` and tag every one-day segment with its trend.
    pub fn from_series(title: impl Into<String>, series: &PriceSeries) -> Result<Self> {
        let extended = series.extended()?;
        let segments = extended
            .dates
            .windows(2)
            .zip(extended.closes.windows(2))
            .zip(extended.trends())
            .map(|((d, c), trend)| Segment {
                from: d[0],
                to: d[1],
                start_close: c[0],
                end_close: c[1],
                trend,
            })
            .collect();

        Ok(Self {
            title: title.into(),
            x_label: "Date".to_string(),
            y_label: "Price (USD)".to_string(),
            series: extended,
            segments,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub label: String,
    pub values: Vec<f64>,
}

/// Grouped bars: one group per category, one bar per series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    pub title: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
}

impl BarChart {
    pub fn new(
        title: impl Into<String>,
        y_label: impl Into<String>,
        categories: Vec<String>,
        series: Vec<BarSeries>,
    ) -> Result<Self> {
        for s in &series {
            if s.values.len() != categories.len() {
                return Err(Error::ChartShape {
                    label: s.label.clone(),
                    len: s.values.len(),
                    expected: categories.len(),
                });
            }
        }
        Ok(Self {
            title: title.into(),
            y_label: y_label.into(),
            categories,
            series,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedLine {
    pub label: String,
    pub series: PriceSeries,
}

/// Several uncoloured price lines on one set of axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub lines: Vec<NamedLine>,
}

/// Write any chart as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, chart: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, serde_json::to_string_pretty(chart)?)?;
    fs::rename(&tmp_path, path)?;
    info!(path = %path.display(), "wrote chart data");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, 6).unwrap() + chrono::Duration::days(offset)
    }

    #[test]
    fn test_colored_line_fills_weekend() {
        let series =
            PriceSeries::new(vec![day(0), day(1), day(4)], vec![10.0, 12.0, 15.0]).unwrap();
        let line = ColoredLine::from_series("TSLA", &series).unwrap();

        assert_eq!(line.series.len(), 5);
        assert_eq!(line.segments.len(), 4);
        let trends: Vec<Trend> = line.segments.iter().map(|s| s.trend).collect();
        assert_eq!(trends, vec![Trend::Up, Trend::Down, Trend::Down, Trend::Up]);
        assert_eq!(line.segments[3].from, day(3));
        assert_eq!(line.segments[3].end_close, 15.0);
    }

    #[test]
    fn test_bar_chart_shape_checked() {
        let ok = BarChart::new(
            "Reddit Stocks VS S&P 500",
            "Percent Annual Return",
            vec!["NKE".to_string(), "L".to_string()],
            vec![BarSeries { label: "Reddit Stock".to_string(), values: vec![1.0, 2.0] }],
        );
        assert!(ok.is_ok());

        let bad = BarChart::new(
            "t",
            "y",
            vec!["NKE".to_string()],
            vec![BarSeries { label: "S&P 500".to_string(), values: vec![] }],
        );
        assert!(matches!(bad, Err(Error::ChartShape { len: 0, expected: 1, .. })));
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts/spy.json");
        let series = PriceSeries::new(vec![day(0), day(1)], vec![1.0, 1.0]).unwrap();
        let line = ColoredLine::from_series("SPY", &series).unwrap();
        write_json(&path, &line).unwrap();

        let back: ColoredLine = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.segments[0].trend, Trend::Down);
        assert_eq!(back, line);
    }
}
