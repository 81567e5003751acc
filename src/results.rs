//! Reddit picks versus the index proxy
//!
//! Every comparison takes a pick's first-mention date as the start of a
//! fixed window (365 days by default) and measures the pick and the proxy
//! over that same window.

use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::calendar::PriceSeries;
use crate::chart::{BarChart, BarSeries, ColoredLine, LineChart, NamedLine};
use crate::error::Result;
use crate::filter::{remove_dupes, FilteredSubmission};
use crate::returns::{annual_return, average};
use crate::stocks::{bars_to_series, is_valid_ticker, stock_window, Bar, MarketData};
use crate::storage::{bars_path, read_bars, write_bars};

/// Bar-chart groups shown by default.
pub const DEFAULT_MAX_BARS: usize = 8;

/// Cached daily bars, one CSV per ticker, overwritten on each fetch.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    data_dir: PathBuf,
}

impl SeriesStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        bars_path(&self.data_dir, ticker)
    }

    pub async fn fetch_and_store<M: MarketData>(
        &self,
        source: &M,
        ticker: &str,
        start: NaiveDate,
        days: i64,
    ) -> Result<Vec<Bar>> {
        let (start, end) = stock_window(start, days);
        let bars = source.daily_bars(ticker, start, end).await?;
        write_bars(&self.path_for(ticker), &bars)?;
        Ok(bars)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TickerComparison {
    pub ticker: String,
    pub proxy: String,
    pub start: NaiveDate,
    pub stock_return: f64,
    pub proxy_return: f64,
    pub stock_line: ColoredLine,
    pub proxy_line: ColoredLine,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickReturn {
    pub ticker: String,
    pub start: NaiveDate,
    pub reddit_return: f64,
    pub proxy_return: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverallComparison {
    pub picks: Vec<PickReturn>,
    pub average_reddit_return: f64,
    pub average_proxy_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerTally {
    pub valid: Vec<String>,
    pub in_index: usize,
}

/// Comparison runs over one market-data source and one bar cache.
pub struct Analysis<'a, M> {
    source: &'a M,
    store: &'a SeriesStore,
    index_proxy: String,
    horizon_days: i64,
}

impl<'a, M: MarketData> Analysis<'a, M> {
    pub fn new(
        source: &'a M,
        store: &'a SeriesStore,
        index_proxy: impl Into<String>,
        horizon_days: i64,
    ) -> Self {
        Self {
            source,
            store,
            index_proxy: index_proxy.into(),
            horizon_days,
        }
    }

    async fn window_series(&self, ticker: &str, start: NaiveDate) -> Result<PriceSeries> {
        let bars = self
            .store
            .fetch_and_store(self.source, ticker, start, self.horizon_days)
            .await?;
        bars_to_series(&bars)
    }

    async fn proxy_return(&self, start: NaiveDate) -> Result<f64> {
        let series = self.window_series(&self.index_proxy, start).await?;
        annual_return(&series.closes)
    }

    /// One ticker against the proxy from `start`, with both coloured lines.
    pub async fn compare_ticker(
        &self,
        ticker: &str,
        start: NaiveDate,
    ) -> Result<TickerComparison> {
        let stock = self.window_series(ticker, start).await?;
        let proxy = self.window_series(&self.index_proxy, start).await?;

        let stock_return = annual_return(&stock.closes)?;
        let proxy_return = annual_return(&proxy.closes)?;
        info!(ticker, %start, stock_return, proxy_return, "one year return");

        Ok(TickerComparison {
            ticker: ticker.to_string(),
            proxy: self.index_proxy.clone(),
            start,
            stock_return,
            proxy_return,
            stock_line: ColoredLine::from_series(ticker, &stock)?,
            proxy_line: ColoredLine::from_series(self.index_proxy.as_str(), &proxy)?,
        })
    }

    /// Average return of every valid pick against the proxy over the same
    /// windows. Fails when no pick is valid.
    pub async fn overall_comparison(
        &self,
        filtered: &[FilteredSubmission],
    ) -> Result<OverallComparison> {
        let mut picks = Vec::new();

        for sub in filtered {
            let start = sub.created_at.date_naive();
            for ticker in remove_dupes(&sub.tickers) {
                if !is_valid_ticker(self.source, &ticker).await? {
                    warn!(ticker = %ticker, "skipping invalid ticker");
                    continue;
                }
                let stock = self.window_series(&ticker, start).await?;
                let reddit_return = annual_return(&stock.closes)?;
                let proxy_return = self.proxy_return(start).await?;
                picks.push(PickReturn {
                    ticker,
                    start,
                    reddit_return,
                    proxy_return,
                });
            }
        }

        let reddit: Vec<f64> = picks.iter().map(|p| p.reddit_return).collect();
        let proxy: Vec<f64> = picks.iter().map(|p| p.proxy_return).collect();
        let average_reddit_return = average(&reddit)?;
        let average_proxy_return = average(&proxy)?;
        info!(
            picks = picks.len(),
            average_reddit_return, average_proxy_return, "overall comparison"
        );

        Ok(OverallComparison {
            picks,
            average_reddit_return,
            average_proxy_return,
        })
    }

    /// Grouped bars for the first `max` valid picks. The pick and the proxy
    /// are both fetched for the pick's own window, so stale cache files from
    /// other start dates are never reused.
    ///
    /// An invalid ticker is skipped and the walk moves on to the next one,
    /// including later tickers of the same post.
    pub async fn bar_comparison(
        &self,
        filtered: &[FilteredSubmission],
        max: usize,
    ) -> Result<BarChart> {
        let mut categories = Vec::new();
        let mut reddit_returns = Vec::new();
        let mut proxy_returns = Vec::new();

        'outer: for sub in filtered {
            let start = sub.created_at.date_naive();
            for ticker in remove_dupes(&sub.tickers) {
                if categories.len() >= max {
                    break 'outer;
                }
                if !is_valid_ticker(self.source, &ticker).await? {
                    continue;
                }
                let series = self.window_series(&ticker, start).await?;
                reddit_returns.push(annual_return(&series.closes)?);
                proxy_returns.push(self.proxy_return(start).await?);
                categories.push(ticker);
            }
        }

        BarChart::new(
            format!("Reddit Stocks VS {}", self.index_proxy),
            "Percent Annual Return",
            categories,
            vec![
                BarSeries {
                    label: "Reddit Stock".to_string(),
                    values: reddit_returns,
                },
                BarSeries {
                    label: self.index_proxy.clone(),
                    values: proxy_returns,
                },
            ],
        )
    }

    /// Every valid ticker across the corpus, and how many tickers belong to
    /// the index membership list.
    pub async fn tally_tickers(
        &self,
        filtered: &[FilteredSubmission],
        index_symbols: &[String],
    ) -> Result<TickerTally> {
        let mut valid = Vec::new();
        let mut in_index = 0;

        for ticker in filtered.iter().flat_map(|sub| sub.tickers.iter()) {
            if is_valid_ticker(self.source, ticker).await? {
                valid.push(ticker.clone());
            }
            if index_symbols.iter().any(|s| s == ticker) {
                in_index += 1;
            }
        }

        info!(valid = valid.len(), in_index, "ticker tally");
        Ok(TickerTally { valid, in_index })
    }
}

/// Plain price lines for tickers already in the cache.
pub fn price_spread(store: &SeriesStore, tickers: &[String]) -> Result<LineChart> {
    let mut lines = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let bars = read_bars(&store.path_for(ticker))?;
        lines.push(NamedLine {
            label: ticker.clone(),
            series: bars_to_series(&bars)?,
        });
    }
    Ok(LineChart {
        title: "Random Spread of Reddit Stocks".to_string(),
        x_label: "Time".to_string(),
        y_label: "Price in USD".to_string(),
        lines,
    })
}
