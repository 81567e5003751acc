//! Daily stock bars from the Alpaca market-data API
//!
//! This module handles:
//! - The `MarketData` seam used by the results layer
//! - Fetching daily bars from Alpaca with page-token pagination
//! - Ticker validity checks and date-window helpers

use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, info, warn};

use crate::calendar::PriceSeries;
use crate::config::Config;
use crate::error::{Error, Result};

/// Any one-day window works for the validity check; this one predates most of
/// the corpus.
const VALIDITY_CHECK_DATE: (i32, u32, u32) = (2018, 1, 1);
const PAGE_LIMIT: &str = "10000";

/// One daily OHLCV bar. Field aliases accept Alpaca's one-letter JSON keys;
/// serialization uses the long names stored in the CSV cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    #[serde(alias = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "o")]
    pub open: f64,
    #[serde(alias = "h")]
    pub high: f64,
    #[serde(alias = "l")]
    pub low: f64,
    #[serde(alias = "c")]
    pub close: f64,
    #[serde(alias = "v")]
    pub volume: u64,
    #[serde(alias = "n", default)]
    pub trade_count: u64,
    #[serde(alias = "vw", default)]
    pub vwap: f64,
}

impl Bar {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// One page of the Alpaca bars endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct BarsPage {
    #[serde(default)]
    pub bars: Option<Vec<Bar>>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Source of daily bars. An unknown symbol is an empty result, not an error.
pub trait MarketData {
    fn daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Bar>>> + Send;
}

/// One request against a paginated bars endpoint. `Ok(None)` means the
/// endpoint has no data for the symbol.
pub trait BarPages {
    fn bars_page(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        page_token: Option<&str>,
    ) -> impl Future<Output = Result<Option<BarsPage>>> + Send;
}

/// Start date plus `days`, as the `(start, end)` request window.
pub fn stock_window(start: NaiveDate, days: i64) -> (NaiveDate, NaiveDate) {
    (start, start + Duration::days(days))
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|source| Error::InvalidDate {
        value: value.to_string(),
        source,
    })
}

/// Closing prices keyed by trading date.
pub fn bars_to_series(bars: &[Bar]) -> Result<PriceSeries> {
    PriceSeries::new(
        bars.iter().map(Bar::date).collect(),
        bars.iter().map(|b| b.close).collect(),
    )
}

/// A symbol is valid when the source has at least one bar for it in a short
/// fixed window.
pub async fn is_valid_ticker<M: MarketData>(source: &M, symbol: &str) -> Result<bool> {
    let (y, m, d) = VALIDITY_CHECK_DATE;
    let day = NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| Error::Config("bad validity check date".to_string()))?;
    let (start, end) = stock_window(day, 1);
    let bars = source.daily_bars(symbol, start, end).await?;
    debug!(symbol, found = !bars.is_empty(), "ticker validity check");
    Ok(!bars.is_empty())
}

/// Decode one bars response. 404 and 422 are how Alpaca answers an unknown
/// symbol, so they mean "no data".
pub fn decode_bars_response(status: StatusCode, text: &str) -> Result<Option<BarsPage>> {
    if status == StatusCode::NOT_FOUND || status == StatusCode::UNPROCESSABLE_ENTITY {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(Error::Api {
            status,
            body: text.to_string(),
        });
    }
    Ok(Some(serde_json::from_str(text)?))
}

/// Follow `next_page_token` until the endpoint stops returning one.
pub async fn collect_bars<P: BarPages>(
    pages: &P,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Bar>> {
    let mut bars = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = match pages
            .bars_page(symbol, start, end, page_token.as_deref())
            .await?
        {
            Some(page) => page,
            None => {
                warn!(symbol, "no data for symbol");
                break;
            }
        };
        bars.extend(page.bars.unwrap_or_default());
        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    info!(symbol, %start, %end, bars = bars.len(), "fetched daily bars");
    Ok(bars)
}

pub struct AlpacaClient {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    secret_key: String,
}

impl AlpacaClient {
    pub fn new(config: &Config) -> Result<Self> {
        config.require_alpaca_keys()?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: config.alpaca_data_url.trim_end_matches('/').to_string(),
            key_id: config.alpaca_key_id.clone(),
            secret_key: config.alpaca_secret_key.clone(),
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.key_id).map_err(|e| Error::Config(e.to_string()))?;
        let secret =
            HeaderValue::from_str(&self.secret_key).map_err(|e| Error::Config(e.to_string()))?;
        headers.insert("APCA-API-KEY-ID", key);
        headers.insert("APCA-API-SECRET-KEY", secret);
        Ok(headers)
    }
}

impl BarPages for AlpacaClient {
    async fn bars_page(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        page_token: Option<&str>,
    ) -> Result<Option<BarsPage>> {
        let url = format!("{}/v2/stocks/{}/bars", self.base_url, symbol);
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();
        let mut query = vec![
            ("timeframe", "1Day"),
            ("adjustment", "raw"),
            ("start", start.as_str()),
            ("end", end.as_str()),
            ("limit", PAGE_LIMIT),
        ];
        if let Some(token) = page_token {
            query.push(("page_token", token));
        }

        let resp = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .query(&query)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        decode_bars_response(status, &text)
    }
}

impl MarketData for AlpacaClient {
    async fn daily_bars(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>> {
        collect_bars(self, symbol, start, end).await
    }
}
