//! Compare stocks picked on Reddit against a market-index proxy.
//!
//! Posts are pulled from Pushshift, filtered for bullish first mentions of
//! `$TICKER` symbols, and each pick's one-year return is measured against the
//! proxy over the same window using Alpaca daily bars.

pub mod calendar;
pub mod chart;
pub mod config;
pub mod error;
pub mod filter;
pub mod reddit;
pub mod results;
pub mod returns;
pub mod stocks;
pub mod storage;

pub use calendar::{fill_gaps, PriceSeries, Trend};
pub use config::Config;
pub use error::{Error, Result};
pub use filter::{filter, filter_with, remove_dupes, FilteredSubmission, SeenTickers, Submission};
pub use returns::annual_return;
pub use stocks::{Bar, MarketData};
