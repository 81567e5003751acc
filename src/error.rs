use thiserror::Error;

/// Errors raised by the filtering, calendar and data-source layers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("submissions must be sorted oldest first: entry {index} is older than its predecessor")]
    UnsortedSubmissions { index: usize },

    #[error("dates and closes differ in length ({dates} vs {closes})")]
    LengthMismatch { dates: usize, closes: usize },
    #[error("dates must be strictly increasing: {previous} is followed by {next}")]
    NonIncreasingDates {
        previous: chrono::NaiveDate,
        next: chrono::NaiveDate,
    },

    #[error("cannot compute a return or average over an empty series")]
    EmptySeries,
    #[error("first close is zero, return is undefined")]
    ZeroBasePrice,

    #[error("unix timestamp {0} is out of range")]
    InvalidTimestamp(i64),
    #[error("invalid date '{value}': {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("chart series '{label}' has {len} values, expected {expected}")]
    ChartShape {
        label: String,
        len: usize,
        expected: usize,
    },

    #[error("request failed [CODE: {status}]: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
