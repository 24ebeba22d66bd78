//! Statistics over a finished crawl
//!
//! This module provides functionality for summarizing and displaying the
//! outcome of a crawl.

use crate::state::CrawlReport;
use crate::url::extract_host;
use std::collections::{BTreeMap, HashSet};

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStatistics {
    /// Number of addresses attempted
    pub total_pages: u64,

    /// Number of addresses fetched successfully
    pub downloaded: u64,

    /// Number of addresses that failed
    pub failed: u64,

    /// Number of distinct hosts among attempted addresses
    pub unique_hosts: u64,

    /// Failures grouped by error kind
    pub error_summary: BTreeMap<&'static str, u64>,
}

impl CrawlStatistics {
    /// Computes statistics from a crawl report
    pub fn from_report(report: &CrawlReport) -> Self {
        let hosts: HashSet<String> = report
            .downloaded
            .iter()
            .chain(report.errors.keys())
            .filter_map(|address| extract_host(address).ok())
            .collect();

        let mut error_summary = BTreeMap::new();
        for error in report.errors.values() {
            *error_summary.entry(error.kind()).or_insert(0) += 1;
        }

        Self {
            total_pages: report.attempted() as u64,
            downloaded: report.downloaded.len() as u64,
            failed: report.errors.len() as u64,
            unique_hosts: hosts.len() as u64,
            error_summary,
        }
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        (self.downloaded as f64 / self.total_pages as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages attempted: {}", stats.total_pages);
    println!("  Downloaded: {}", stats.downloaded);
    println!("  Failed: {}", stats.failed);
    println!("  Unique hosts: {}", stats.unique_hosts);
    println!();

    if !stats.error_summary.is_empty() {
        println!("Error Summary:");
        let mut error_counts: Vec<_> = stats.error_summary.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in error_counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages downloaded)",
        stats.success_rate(),
        stats.downloaded,
        stats.total_pages
    );
}
