//! webcrawler: a concurrent, host-aware web crawler
//!
//! This crate explores a link graph breadth-first from a seed address up to a
//! depth limit. Network fetches and link extraction run on two independently
//! sized worker pools, and a per-host admission queue caps how many fetches hit
//! the same host at once.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Error that stops a crawl before it starts
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Invalid seed URL: {0}")]
    InvalidSeed(#[from] UrlError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL '{url}': {message}")]
    Parse { url: String, message: String },

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Failure to retrieve a single address
///
/// Recorded against the address in the crawl report; never aborts the crawl.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Malformed address: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("Could not fetch {url}: {message}")]
    Unavailable { url: String, message: String },
}

impl FetchError {
    /// Short label used to group errors in statistics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http { .. } => "http",
            Self::Status { .. } => "status",
            Self::Timeout { .. } => "timeout",
            Self::InvalidUrl(_) => "invalid-url",
            Self::Unavailable { .. } => "unavailable",
        }
    }
}

/// Failure to extract links from a fetched document
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Expected HTML from {url}, got {content_type}")]
    NotHtml { url: String, content_type: String },

    #[error("HTML parse error for {url}: {message}")]
    Parse { url: String, message: String },
}

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Document, Fetcher, HttpFetcher, WebCrawler};
pub use state::CrawlReport;
pub use crate::url::extract_host;
