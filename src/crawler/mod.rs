//! Crawler module: the concurrent crawl engine
//!
//! This module contains the core crawling logic, including:
//! - The `Fetcher` / `Document` seams and the HTTP implementation
//! - HTML link extraction
//! - Bounded worker pools for downloads and extraction
//! - The completion tracker that detects the end of a crawl
//! - Overall crawl orchestration (`WebCrawler`)

mod engine;
mod fetcher;
mod parser;
mod pool;
mod tracker;

pub use engine::WebCrawler;
pub use fetcher::{build_http_client, Document, Fetcher, HttpFetcher};
pub use parser::{parse_links, HtmlDocument};
pub use pool::{Job, WorkerPool};
pub use tracker::{CompletionTracker, Unit};
