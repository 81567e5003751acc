//! Reddit submissions from the Pushshift archive

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter::Submission;

/// Pushshift caps a page at 500 submissions.
pub const PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct RawSubmission {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub created_utc: i64,
}

impl RawSubmission {
    pub fn into_submission(self) -> Result<Submission> {
        let created_at = DateTime::<Utc>::from_timestamp(self.created_utc, 0)
            .ok_or(Error::InvalidTimestamp(self.created_utc))?;
        Ok(Submission::new(self.title, self.selftext, created_at))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Vec<RawSubmission>,
}

/// Unix timestamp of midnight UTC on a `YYYY-MM-DD` date.
pub fn day_start_timestamp(date: &str) -> Result<i64> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|source| Error::InvalidDate {
        value: date.to_string(),
        source,
    })?;
    Ok(day.and_time(chrono::NaiveTime::MIN).and_utc().timestamp())
}

/// Convert raw records and sort them oldest first, the order the filter needs.
pub fn into_sorted_submissions(raw: Vec<RawSubmission>) -> Result<Vec<Submission>> {
    let mut subs = raw
        .into_iter()
        .map(RawSubmission::into_submission)
        .collect::<Result<Vec<_>>>()?;
    subs.sort_by_key(|s| s.created_at);
    Ok(subs)
}

/// One search request against the archive: submissions created strictly
/// after `after` and before `before`, oldest first, at most [`PAGE_SIZE`].
pub trait SubmissionPages {
    fn page(
        &self,
        subreddit: &str,
        after: i64,
        before: i64,
    ) -> impl Future<Output = Result<Vec<RawSubmission>>> + Send;
}

/// Every submission in `[after, before)` up to `limit`, oldest first.
///
/// `after` is exclusive, so each full page is followed by a request starting
/// one second before its newest timestamp. Posts sharing that timestamp come
/// back again and are dropped as repeats.
pub async fn collect_submissions<P: SubmissionPages>(
    pages: &P,
    subreddit: &str,
    after: i64,
    before: i64,
    limit: usize,
) -> Result<Vec<Submission>> {
    let mut all: Vec<RawSubmission> = Vec::new();
    let mut seen: HashSet<(String, i64, String)> = HashSet::new();
    let mut cursor = after;

    while all.len() < limit {
        let page = pages.page(subreddit, cursor, before).await?;
        let full_page = page.len() >= PAGE_SIZE;
        let next_cursor = page.iter().map(|p| p.created_utc).max();

        let before_len = all.len();
        for raw in page {
            if seen.insert((raw.id.clone(), raw.created_utc, raw.title.clone())) {
                all.push(raw);
            }
        }
        let added = all.len() - before_len;
        debug!(subreddit, cursor, added, "pushshift page");

        match next_cursor {
            Some(last) if full_page && added > 0 => cursor = last - 1,
            _ => break,
        }
    }
    all.truncate(limit);

    info!(subreddit, count = all.len(), "pulled reddit submissions");
    into_sorted_submissions(all)
}

pub struct PushshiftClient {
    client: reqwest::Client,
    base_url: String,
}

impl PushshiftClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: config.pushshift_url.trim_end_matches('/').to_string(),
        })
    }

    /// Every submission in `[after, before)` up to `limit`, oldest first.
    pub async fn submissions(
        &self,
        subreddit: &str,
        after: i64,
        before: i64,
        limit: usize,
    ) -> Result<Vec<Submission>> {
        collect_submissions(self, subreddit, after, before, limit).await
    }
}

impl SubmissionPages for PushshiftClient {
    async fn page(&self, subreddit: &str, after: i64, before: i64) -> Result<Vec<RawSubmission>> {
        let url = format!("{}/reddit/submission/search/", self.base_url);
        let query = [
            ("subreddit", subreddit.to_string()),
            ("limit", PAGE_SIZE.to_string()),
            ("after", after.to_string()),
            ("before", before.to_string()),
            ("sort", "asc".to_string()),
        ];
        let resp = self.client.get(&url).query(&query).send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Api { status, body: text });
        }

        let page: SearchResponse = serde_json::from_str(&text)?;
        Ok(page.data)
    }
}
