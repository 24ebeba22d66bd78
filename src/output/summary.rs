//! Crawl summary data
//!
//! A `CrawlSummary` is the crawl report plus run metadata, laid out for
//! rendering.

use crate::output::stats::CrawlStatistics;
use crate::state::CrawlReport;
use chrono::{DateTime, Utc};

/// Error information for a failed address
#[derive(Debug, Clone, PartialEq)]
pub struct FailedPage {
    /// The address that failed
    pub url: String,

    /// Error kind (see `FetchError::kind`)
    pub kind: &'static str,

    /// Error message
    pub message: String,
}

/// Summary of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// The seed address
    pub seed: String,

    /// The depth the crawl was started with
    pub depth: u32,

    /// When the crawl started
    pub started_at: DateTime<Utc>,

    /// When the crawl finished
    pub finished_at: DateTime<Utc>,

    /// Aggregate counts
    pub statistics: CrawlStatistics,

    /// Addresses fetched successfully, sorted
    pub downloaded: Vec<String>,

    /// Failed addresses, sorted by address
    pub failed: Vec<FailedPage>,
}

impl CrawlSummary {
    /// Builds a summary from a finished crawl
    pub fn new(
        seed: impl Into<String>,
        depth: u32,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        report: &CrawlReport,
    ) -> Self {
        let mut failed: Vec<FailedPage> = report
            .errors
            .iter()
            .map(|(url, error)| FailedPage {
                url: url.clone(),
                kind: error.kind(),
                message: error.to_string(),
            })
            .collect();
        failed.sort_by(|a, b| a.url.cmp(&b.url));

        Self {
            seed: seed.into(),
            depth,
            started_at,
            finished_at,
            statistics: CrawlStatistics::from_report(report),
            downloaded: report.downloaded.clone(),
            failed,
        }
    }

    /// Wall-clock duration of the crawl
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
