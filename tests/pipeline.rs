use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use std::collections::HashMap;

use reddit_picks::results::{price_spread, Analysis, SeriesStore};
use reddit_picks::stocks::{is_valid_ticker, Bar, MarketData};
use reddit_picks::storage::{read_filtered, write_filtered};
use reddit_picks::{filter, Error, Result, Submission, Trend};

/// Daily bars held in memory, answered by date range like the real API.
struct FakeMarket {
    bars: HashMap<String, Vec<Bar>>,
}

impl FakeMarket {
    fn new() -> Self {
        Self { bars: HashMap::new() }
    }

    /// Weekday closes starting at `start`, one per entry of `closes`.
    fn with_weekdays(mut self, symbol: &str, start: NaiveDate, closes: &[f64]) -> Self {
        let mut day = start;
        let mut bars = Vec::new();
        for close in closes {
            while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                day += Duration::days(1);
            }
            bars.push(bar(day, *close));
            day += Duration::days(1);
        }
        self.bars.insert(symbol.to_string(), bars);
        self
    }
}

impl MarketData for FakeMarket {
    async fn daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>> {
        Ok(self
            .bars
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date() >= start && b.date() <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn bar(day: NaiveDate, close: f64) -> Bar {
    Bar {
        timestamp: day.and_hms_opt(4, 0, 0).unwrap().and_utc(),
        open: close,
        high: close,
        low: close,
        close,
        volume: 100,
        trade_count: 1,
        vwap: close,
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn corpus() -> Vec<Submission> {
    let at = |d: u32| Utc.with_ymd_and_hms(2018, 1, d, 15, 0, 0).unwrap();
    vec![
        Submission::new("I'm going long $TSLA to the moon", "", at(1)),
        Submission::new("$TSLA $AAPL long play, no shorts", "", at(2)),
        Submission::new("long $ZZZZ", "trust me", at(3)),
        Submission::new("Is $NKE a long buy?", "", at(4)),
    ]
}

fn market() -> FakeMarket {
    FakeMarket::new()
        .with_weekdays("TSLA", date("2018-01-01"), &[100.0, 110.0, 120.0, 150.0])
        .with_weekdays("AAPL", date("2018-01-01"), &[200.0, 190.0, 180.0, 100.0])
        .with_weekdays("SPY", date("2018-01-01"), &[100.0, 101.0, 102.0, 110.0])
}

#[test]
fn test_filter_then_persist_round_trip() {
    let filtered = filter(&corpus(), "SPY").unwrap();
    let tickers: Vec<Vec<String>> = filtered.iter().map(|f| f.tickers.clone()).collect();
    assert_eq!(tickers, vec![vec!["TSLA"], vec!["AAPL"], vec!["ZZZZ"]]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reddit_subs_filtered.csv");
    write_filtered(&path, &filtered).unwrap();
    assert_eq!(read_filtered(&path).unwrap(), filtered);
}

#[test]
fn test_filter_rejects_reversed_corpus() {
    let mut reversed = corpus();
    reversed.reverse();
    assert!(matches!(
        filter(&reversed, "SPY"),
        Err(Error::UnsortedSubmissions { .. })
    ));
}

#[tokio::test]
async fn test_ticker_validity() {
    let market = market();
    assert!(is_valid_ticker(&market, "TSLA").await.unwrap());
    assert!(!is_valid_ticker(&market, "ZZZZ").await.unwrap());
}

#[tokio::test]
async fn test_compare_ticker_writes_cache_and_lines() {
    let dir = tempfile::tempdir().unwrap();
    let market = market();
    let store = SeriesStore::new(dir.path());
    let analysis = Analysis::new(&market, &store, "SPY", 365);

    let cmp = analysis.compare_ticker("TSLA", date("2018-01-01")).await.unwrap();
    assert_eq!(cmp.stock_return, 50.0);
    assert_eq!(cmp.proxy_return, 10.0);
    assert!(store.path_for("TSLA").exists());
    assert!(store.path_for("SPY").exists());

    // 2018-01-01 is a Monday, so four weekday bars span four calendar days.
    assert_eq!(cmp.stock_line.series.len(), 4);
    assert!(cmp.stock_line.segments.iter().all(|s| s.trend == Trend::Up));
}

#[tokio::test]
async fn test_overall_comparison_skips_invalid_picks() {
    let dir = tempfile::tempdir().unwrap();
    let market = market();
    let store = SeriesStore::new(dir.path());
    let analysis = Analysis::new(&market, &store, "SPY", 365);

    let filtered = filter(&corpus(), "SPY").unwrap();
    let overall = analysis.overall_comparison(&filtered).await.unwrap();

    let picked: Vec<&str> = overall.picks.iter().map(|p| p.ticker.as_str()).collect();
    assert_eq!(picked, vec!["TSLA", "AAPL"]);
    // AAPL was first mentioned a day later, so its window starts at 190.
    let expected_reddit = (50.0 + (100.0 - 190.0) / 190.0 * 100.0) / 2.0;
    let expected_proxy = (10.0 + (110.0 - 101.0) / 101.0 * 100.0) / 2.0;
    assert!((overall.average_reddit_return - expected_reddit).abs() < 1e-9);
    assert!((overall.average_proxy_return - expected_proxy).abs() < 1e-9);
}

#[tokio::test]
async fn test_overall_comparison_without_valid_picks_fails() {
    let dir = tempfile::tempdir().unwrap();
    let market = FakeMarket::new();
    let store = SeriesStore::new(dir.path());
    let analysis = Analysis::new(&market, &store, "SPY", 365);

    let filtered = filter(&corpus(), "SPY").unwrap();
    assert!(matches!(
        analysis.overall_comparison(&filtered).await,
        Err(Error::EmptySeries)
    ));
}

#[tokio::test]
async fn test_bar_comparison_caps_groups() {
    let dir = tempfile::tempdir().unwrap();
    let market = market();
    let store = SeriesStore::new(dir.path());
    let analysis = Analysis::new(&market, &store, "SPY", 365);

    let filtered = filter(&corpus(), "SPY").unwrap();
    let chart = analysis.bar_comparison(&filtered, 1).await.unwrap();
    assert_eq!(chart.categories, vec!["TSLA"]);
    assert_eq!(chart.series[0].values, vec![50.0]);
    assert_eq!(chart.series[1].label, "SPY");
    assert_eq!(chart.series[1].values, vec![10.0]);
}

#[tokio::test]
async fn test_bar_comparison_ignores_cache_from_other_window() {
    let dir = tempfile::tempdir().unwrap();
    let market = market();
    let store = SeriesStore::new(dir.path());
    let analysis = Analysis::new(&market, &store, "SPY", 365);

    // Leaves TSLA cached from 2018-01-03, two days after its first mention.
    let later = analysis.compare_ticker("TSLA", date("2018-01-03")).await.unwrap();
    assert_eq!(later.stock_return, 25.0);

    let filtered = filter(&corpus(), "SPY").unwrap();
    let chart = analysis.bar_comparison(&filtered, 1).await.unwrap();
    assert_eq!(chart.categories, vec!["TSLA"]);
    assert_eq!(chart.series[0].values, vec![50.0]);
    assert_eq!(chart.series[1].values, vec![10.0]);
}

#[tokio::test]
async fn test_tally_and_spread() {
    let dir = tempfile::tempdir().unwrap();
    let market = market();
    let store = SeriesStore::new(dir.path());
    let analysis = Analysis::new(&market, &store, "SPY", 365);

    let filtered = filter(&corpus(), "SPY").unwrap();
    let index = vec!["AAPL".to_string(), "MSFT".to_string(), "ZZZZ".to_string()];
    let tally = analysis.tally_tickers(&filtered, &index).await.unwrap();
    assert_eq!(tally.valid, vec!["TSLA", "AAPL"]);
    assert_eq!(tally.in_index, 2);

    analysis.compare_ticker("AAPL", date("2018-01-01")).await.unwrap();
    let spread = price_spread(&store, &["AAPL".to_string(), "SPY".to_string()]).unwrap();
    assert_eq!(spread.lines.len(), 2);
    assert_eq!(spread.lines[0].series.closes, vec![200.0, 190.0, 180.0, 100.0]);
    assert!(price_spread(&store, &["NOPE".to_string()]).is_err());
}
