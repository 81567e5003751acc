//! Ticker and sentiment filtering of Reddit submissions
//!
//! A post survives when it:
//! - mentions at least one `$TICKER`
//! - says "long" and never "short"
//! - asks no question
//!
//! Each ticker is credited to the first post that mentions it. The running
//! set of credited tickers is an explicit [`SeenTickers`] accumulator owned by
//! the caller for the length of one pipeline run.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::error::{Error, Result};

static TICKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Z]+)").expect("valid ticker regex"));
static LONG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[Ll]ong ").expect("valid long regex"));
static SHORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[Ss]hort ").expect("valid short regex"));

/// One post as returned by the social-post source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            created_at,
        }
    }

    /// Title and body joined by a space so a ticker at the end of the title
    /// cannot run into the first word of the body.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.title, self.body)
    }
}

/// A submission that introduced at least one ticker not seen before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredSubmission {
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub tickers: Vec<String>,
}

/// Tickers already credited to an earlier post.
#[derive(Debug, Clone, Default)]
pub struct SeenTickers {
    seen: HashSet<String>,
}

impl SeenTickers {
    /// Start a run with the index proxy already seen, so posts about the
    /// benchmark itself never count as picks.
    pub fn seeded(index_proxy: &str) -> Self {
        let mut seen = HashSet::new();
        seen.insert(index_proxy.to_string());
        Self { seen }
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.seen.contains(ticker)
    }

    /// Returns true when the ticker was new.
    pub fn insert(&mut self, ticker: &str) -> bool {
        self.seen.insert(ticker.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Every `$TICKER` candidate in `text`, in order of appearance.
pub fn find_tickers(text: &str) -> Vec<String> {
    TICKER_RE
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn has_question_mark(text: &str) -> bool {
    text.contains('?')
}

pub fn mentions_long(text: &str) -> bool {
    LONG_RE.is_match(text)
}

pub fn mentions_short(text: &str) -> bool {
    SHORT_RE.is_match(text)
}

/// Drop repeats (first occurrence wins) and empty strings.
pub fn remove_dupes<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    let mut res: Vec<String> = Vec::new();
    for item in items {
        let item = item.as_ref();
        if !item.is_empty() && !res.iter().any(|r| r == item) {
            res.push(item.to_string());
        }
    }
    res
}

/// Apply the keyword heuristics and return the post's deduplicated ticker
/// candidates, or `None` when the post is rejected.
fn bullish_candidates(text: &str) -> Option<Vec<String>> {
    let tickers = find_tickers(text);
    if tickers.is_empty()
        || has_question_mark(text)
        || !mentions_long(text)
        || mentions_short(text)
    {
        return None;
    }
    Some(remove_dupes(&tickers))
}

/// Filter one submission against the running set. Newly credited tickers are
/// recorded in `seen` in order of first appearance within the post.
pub fn filter_one(submission: &Submission, seen: &mut SeenTickers) -> Option<FilteredSubmission> {
    let candidates = bullish_candidates(&submission.full_text())?;

    let new_tickers: Vec<String> = candidates
        .into_iter()
        .filter(|ticker| seen.insert(ticker))
        .collect();

    if new_tickers.is_empty() {
        debug!(title = %submission.title, "all tickers already credited, dropping post");
        return None;
    }

    Some(FilteredSubmission {
        title: submission.title.clone(),
        body: submission.body.clone(),
        created_at: submission.created_at,
        tickers: new_tickers,
    })
}

/// Fail unless `submissions` is in ascending creation order. First-mention
/// credit only means something on a chronological corpus.
pub fn ensure_sorted(submissions: &[Submission]) -> Result<()> {
    match submissions
        .windows(2)
        .position(|pair| pair[1].created_at < pair[0].created_at)
    {
        Some(pos) => Err(Error::UnsortedSubmissions { index: pos + 1 }),
        None => Ok(()),
    }
}

/// Filter a chronologically sorted corpus, threading `seen` through every
/// post. Reusing the same `seen` on a later call never re-emits a ticker.
pub fn filter_with(
    submissions: &[Submission],
    seen: &mut SeenTickers,
) -> Result<Vec<FilteredSubmission>> {
    ensure_sorted(submissions)?;

    let kept: Vec<FilteredSubmission> = submissions
        .iter()
        .filter_map(|submission| filter_one(submission, seen))
        .collect();

    debug!(input = submissions.len(), kept = kept.len(), "filtered submissions");
    Ok(kept)
}

/// Filter a corpus with a fresh run seeded by `index_proxy`.
pub fn filter(submissions: &[Submission], index_proxy: &str) -> Result<Vec<FilteredSubmission>> {
    let mut seen = SeenTickers::seeded(index_proxy);
    filter_with(submissions, &mut seen)
}
