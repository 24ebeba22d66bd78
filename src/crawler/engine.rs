//! Crawl orchestration
//!
//! `WebCrawler` owns the download and extraction pools. Each `crawl` call
//! creates a fresh `CrawlSession` holding the per-crawl state (visited set,
//! results, host queues, completion tracker) and drives the recursive
//! exploration from the seed:
//!
//! 1. Skip the address if depth is exhausted or it was already visited
//! 2. Register a fetch unit and hand the fetch to the host's admission queue
//! 3. On failure, record the error; on success, record the download and
//!    schedule link extraction on the extraction pool
//! 4. Feed every extracted link back into step 1 one level shallower
//!
//! The crawl returns once the completion tracker reports that every fetch and
//! extraction spawned along the way has finished.

use crate::config::{validate_crawler_config, CrawlerConfig};
use crate::crawler::fetcher::{Document, Fetcher};
use crate::crawler::pool::WorkerPool;
use crate::crawler::tracker::{CompletionTracker, Unit};
use crate::state::{CrawlReport, HostRegistry, SessionState};
use crate::url::extract_host;
use crate::{ConfigError, CrawlerError, FetchError};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

/// Concurrent crawler with independent download, extraction and per-host limits
pub struct WebCrawler {
    fetcher: Arc<dyn Fetcher>,
    downloaders: Arc<WorkerPool>,
    extractors: Arc<WorkerPool>,
    per_host: usize,
}

impl WebCrawler {
    /// Creates a crawler
    ///
    /// Only `downloaders`, `extractors` and `per_host` of `limits` are used
    /// here; depth is passed to each [`crawl`](Self::crawl) call.
    ///
    /// # Returns
    ///
    /// * `Ok(WebCrawler)` - Crawler ready to use
    /// * `Err(ConfigError)` - A pool size or the per-host limit is zero
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use webcrawler::config::{CrawlerConfig, HttpConfig, UserAgentConfig};
    /// use webcrawler::{HttpFetcher, WebCrawler};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let fetcher = HttpFetcher::new(&UserAgentConfig::default(), &HttpConfig::default())?;
    /// let crawler = WebCrawler::new(Arc::new(fetcher), &CrawlerConfig::new(2, 8, 2, 2))?;
    /// let report = crawler.crawl("https://example.com/", 2).await?;
    /// println!("{} pages downloaded", report.downloaded.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(fetcher: Arc<dyn Fetcher>, limits: &CrawlerConfig) -> Result<Self, ConfigError> {
        validate_crawler_config(limits)?;

        Ok(Self {
            fetcher,
            downloaders: WorkerPool::new("download", limits.downloaders)?,
            extractors: WorkerPool::new("extraction", limits.extractors)?,
            per_host: limits.per_host,
        })
    }

    /// Crawls from `seed`, following links up to `depth` hops
    ///
    /// The seed itself counts as the first hop: depth 1 fetches only the seed,
    /// depth 0 fetches nothing.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Downloaded addresses and per-address failures
    /// * `Err(CrawlerError::InvalidSeed)` - The seed is not an absolute URL with a host
    pub async fn crawl(&self, seed: &str, depth: u32) -> Result<CrawlReport, CrawlerError> {
        let host = extract_host(seed)?;
        tracing::info!("Starting crawl of {} (host {}) to depth {}", seed, host, depth);

        let started = Instant::now();
        let session = CrawlSession::new(self);

        let root = session.tracker.register();
        session.process(seed.to_string(), depth);
        root.arrive();
        session.tracker.wait().await;

        let report = session.state.take_report();
        tracing::info!(
            "Crawl of {} finished in {:?}: {} downloaded, {} failed, {} host(s)",
            seed,
            started.elapsed(),
            report.downloaded.len(),
            report.errors.len(),
            session.hosts.host_count()
        );

        Ok(report)
    }

    /// Stops both pools immediately
    ///
    /// Running fetches and extractions are aborted and queued ones discarded.
    /// Crawling after `close` returns whatever was finished before it.
    pub fn close(&self) {
        tracing::debug!("Shutting down crawler pools");
        self.downloaders.shutdown();
        self.extractors.shutdown();
    }
}

impl Drop for WebCrawler {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for WebCrawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebCrawler")
            .field("downloaders", &self.downloaders.size())
            .field("extractors", &self.extractors.size())
            .field("per_host", &self.per_host)
            .finish()
    }
}

/// State and collaborators shared by every task of one crawl
struct CrawlSession {
    fetcher: Arc<dyn Fetcher>,
    extractors: Arc<WorkerPool>,
    hosts: HostRegistry,
    tracker: Arc<CompletionTracker>,
    state: SessionState,
}

impl CrawlSession {
    fn new(crawler: &WebCrawler) -> Arc<Self> {
        Arc::new(Self {
            fetcher: Arc::clone(&crawler.fetcher),
            extractors: Arc::clone(&crawler.extractors),
            hosts: HostRegistry::new(crawler.per_host, Arc::clone(&crawler.downloaders)),
            tracker: CompletionTracker::new(),
            state: SessionState::new(),
        })
    }

    /// Admits an address and schedules its fetch
    fn process(self: &Arc<Self>, url: String, depth: u32) {
        if depth == 0 || !self.state.mark_visited(&url) {
            return;
        }

        let host = match extract_host(&url) {
            Ok(host) => host,
            Err(e) => {
                tracing::debug!("Cannot resolve host of {}: {}", url, e);
                self.state.record_error(url, FetchError::InvalidUrl(e));
                return;
            }
        };

        let unit = self.tracker.register();
        let session = Arc::clone(self);
        self.hosts
            .queue_for(&host)
            .submit(async move { session.download(url, depth, unit).await });
    }

    /// Fetches an address; runs on the download pool
    async fn download(self: Arc<Self>, url: String, depth: u32, unit: Unit) {
        tracing::debug!("Fetching {} (depth {})", url, depth);

        match self.fetch(&url).await {
            Ok(document) => {
                self.state.record_download(url.clone());

                let extraction = self.tracker.register();
                let session = Arc::clone(&self);
                self.extractors
                    .submit(async move { session.extract(url, depth, document, extraction).await });
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                self.state.record_error(url, e);
            }
        }

        // Frees the host slot without waiting for extraction.
        unit.arrive();
    }

    /// Runs the fetch in its own task so a panicking fetcher becomes an
    /// ordinary failure for this address
    async fn fetch(&self, url: &str) -> Result<Box<dyn Document>, FetchError> {
        let fetcher = Arc::clone(&self.fetcher);
        let target = url.to_string();
        let mut task = AbortOnDrop(tokio::spawn(async move { fetcher.fetch(&target).await }));

        match (&mut task.0).await {
            Ok(result) => result,
            Err(e) => Err(FetchError::Unavailable {
                url: url.to_string(),
                message: format!("fetch task failed: {}", e),
            }),
        }
    }

    /// Extracts links from a fetched document; runs on the extraction pool
    async fn extract(
        self: Arc<Self>,
        url: String,
        depth: u32,
        document: Box<dyn Document>,
        unit: Unit,
    ) {
        let links = tokio::task::spawn_blocking(move || document.extract_links()).await;

        match links {
            Ok(Ok(links)) => {
                tracing::debug!("Found {} link(s) on {}", links.len(), url);
                for link in links {
                    self.process(link, depth - 1);
                }
            }
            Ok(Err(e)) => tracing::debug!("Skipping links of {}: {}", url, e),
            Err(e) => tracing::warn!("Link extraction for {} did not complete: {}", url, e),
        }

        unit.arrive();
    }
}

/// Aborts the fetch task when the download holding it is aborted
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}
