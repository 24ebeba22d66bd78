//! Output module for crawl summaries and reports
//!
//! This module handles:
//! - Computing statistics over a crawl report
//! - Printing statistics to the console
//! - Writing markdown summaries

mod markdown;
pub mod stats;
mod summary;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, CrawlStatistics};
pub use summary::{CrawlSummary, FailedPage};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
