//! Crawl engine tests against an in-memory link graph

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use webcrawler::config::CrawlerConfig;
use webcrawler::{extract_host, Document, ExtractionError, FetchError, Fetcher, WebCrawler};

struct GraphDocument {
    links: Vec<String>,
    broken: bool,
}

impl Document for GraphDocument {
    fn extract_links(&self) -> Result<Vec<String>, ExtractionError> {
        if self.broken {
            return Err(ExtractionError::Parse {
                url: "broken".to_string(),
                message: "unparseable".to_string(),
            });
        }
        Ok(self.links.clone())
    }
}

/// Fetcher over a fixed link graph that records how it was called
#[derive(Default)]
struct GraphFetcher {
    pages: HashMap<String, Vec<String>>,
    broken: HashSet<String>,
    panics: HashSet<String>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: Mutex<HashMap<String, usize>>,
    max_per_host: AtomicUsize,
    total_in_flight: AtomicUsize,
    max_total: AtomicUsize,
}

impl GraphFetcher {
    fn page(mut self, url: &str, links: &[&str]) -> Self {
        self.pages
            .insert(url.to_string(), links.iter().map(|l| l.to_string()).collect());
        self
    }

    fn broken_page(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), Vec::new());
        self.broken.insert(url.to_string());
        self
    }

    fn panicking_page(mut self, url: &str) -> Self {
        self.panics.insert(url.to_string());
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn enter(&self, host: &str) {
        let mut in_flight = self.in_flight.lock().unwrap();
        let count = in_flight.entry(host.to_string()).or_insert(0);
        *count += 1;
        self.max_per_host.fetch_max(*count, Ordering::SeqCst);
        drop(in_flight);

        let total = self.total_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_total.fetch_max(total, Ordering::SeqCst);
    }

    fn leave(&self, host: &str) {
        let mut in_flight = self.in_flight.lock().unwrap();
        if let Some(count) = in_flight.get_mut(host) {
            *count -= 1;
        }
        self.total_in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for GraphFetcher {
    async fn fetch(&self, url: &str) -> Result<Box<dyn Document>, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let host = extract_host(url)?;
        if self.panics.contains(url) {
            panic!("fetcher blew up on {}", url);
        }

        self.enter(&host);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.leave(&host);

        match self.pages.get(url) {
            Some(links) => Ok(Box::new(GraphDocument {
                links: links.clone(),
                broken: self.broken.contains(url),
            })),
            None => Err(FetchError::Unavailable {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

fn crawler(fetcher: &Arc<GraphFetcher>, limits: CrawlerConfig) -> WebCrawler {
    WebCrawler::new(fetcher.clone(), &limits).unwrap()
}

#[tokio::test]
async fn test_each_address_fetched_once() {
    let fetcher = Arc::new(
        GraphFetcher::default()
            .page("https://a.com/", &["https://a.com/x", "https://a.com/y", "https://a.com/x"])
            .page("https://a.com/x", &["https://a.com/y", "https://a.com/"])
            .page("https://a.com/y", &["https://a.com/x"]),
    );
    let crawler = crawler(&fetcher, CrawlerConfig::new(10, 4, 4, 2));

    let report = crawler.crawl("https://a.com/", 10).await.unwrap();

    let mut calls = fetcher.calls();
    calls.sort();
    assert_eq!(calls, vec!["https://a.com/", "https://a.com/x", "https://a.com/y"]);
    assert_eq!(report.downloaded, calls);
}

#[tokio::test]
async fn test_depth_bounds_the_crawl() {
    let fetcher = Arc::new(
        GraphFetcher::default()
            .page("https://a.com/", &["https://b.com/"])
            .page("https://b.com/", &["https://c.com/"])
            .page("https://c.com/", &[]),
    );
    let crawler = crawler(&fetcher, CrawlerConfig::new(2, 2, 2, 1));

    let report = crawler.crawl("https://a.com/", 2).await.unwrap();

    assert_eq!(report.downloaded, vec!["https://a.com/", "https://b.com/"]);
    assert!(report.errors.is_empty());
    assert!(!fetcher.calls().contains(&"https://c.com/".to_string()));
}

#[tokio::test]
async fn test_cycle_terminates() {
    let fetcher = Arc::new(
        GraphFetcher::default()
            .page("https://a.com/", &["https://b.com/"])
            .page("https://b.com/", &["https://a.com/"]),
    );
    let crawler = crawler(&fetcher, CrawlerConfig::default());

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        crawler.crawl("https://a.com/", u32::MAX),
    )
    .await
    .expect("crawl of a cycle should finish")
    .unwrap();

    assert_eq!(report.downloaded, vec!["https://a.com/", "https://b.com/"]);
    assert_eq!(fetcher.calls().len(), 2);
}

#[tokio::test]
async fn test_failures_are_isolated() {
    let fetcher = Arc::new(
        GraphFetcher::default()
            .page("https://a.com/", &["https://down.com/", "https://a.com/ok"])
            .page("https://a.com/ok", &[]),
    );
    let crawler = crawler(&fetcher, CrawlerConfig::new(3, 2, 2, 2));

    let report = crawler.crawl("https://a.com/", 3).await.unwrap();

    assert_eq!(report.downloaded, vec!["https://a.com/", "https://a.com/ok"]);
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(
        report.errors["https://down.com/"],
        FetchError::Unavailable { .. }
    ));

    // No address is both downloaded and failed
    for url in report.errors.keys() {
        assert!(!report.is_downloaded(url));
    }
}

#[tokio::test]
async fn test_failed_seed_is_reported() {
    let fetcher = Arc::new(GraphFetcher::default());
    let crawler = crawler(&fetcher, CrawlerConfig::new(3, 2, 2, 2));

    let report = crawler.crawl("https://down.com/", 3).await.unwrap();

    assert!(report.downloaded.is_empty());
    assert!(report.errors.contains_key("https://down.com/"));
}

#[tokio::test]
async fn test_extraction_failure_is_swallowed() {
    let fetcher = Arc::new(
        GraphFetcher::default()
            .page("https://a.com/", &["https://a.com/broken", "https://a.com/fine"])
            .broken_page("https://a.com/broken")
            .page("https://a.com/fine", &[]),
    );
    let crawler = crawler(&fetcher, CrawlerConfig::new(5, 2, 1, 2));

    let report = crawler.crawl("https://a.com/", 5).await.unwrap();

    assert_eq!(
        report.downloaded,
        vec!["https://a.com/", "https://a.com/broken", "https://a.com/fine"]
    );
    assert!(report.errors.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_per_host_limit_respected() {
    let links: Vec<String> = (0..200).map(|i| format!("https://busy.com/{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();

    let mut fetcher = GraphFetcher::default()
        .page("https://busy.com/", &link_refs)
        .with_delay(Duration::from_millis(2));
    for link in &links {
        fetcher = fetcher.page(link, &[]);
    }
    let fetcher = Arc::new(fetcher);
    let crawler = crawler(&fetcher, CrawlerConfig::new(2, 16, 4, 3));

    let report = crawler.crawl("https://busy.com/", 2).await.unwrap();

    assert_eq!(report.downloaded.len(), 201);
    let max = fetcher.max_per_host.load(Ordering::SeqCst);
    assert!(max <= 3, "saw {} concurrent fetches to one host", max);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_download_pool_limit_respected() {
    let links: Vec<String> = (0..60).map(|i| format!("https://h{}.com/", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();

    let mut fetcher = GraphFetcher::default()
        .page("https://seed.com/", &link_refs)
        .with_delay(Duration::from_millis(5));
    for link in &links {
        fetcher = fetcher.page(link, &[]);
    }
    let fetcher = Arc::new(fetcher);
    let crawler = crawler(&fetcher, CrawlerConfig::new(2, 4, 2, 8));

    let report = crawler.crawl("https://seed.com/", 2).await.unwrap();

    assert_eq!(report.downloaded.len(), 61);
    let max = fetcher.max_total.load(Ordering::SeqCst);
    assert!(max <= 4, "saw {} concurrent fetches", max);
}

#[tokio::test]
async fn test_zero_depth_is_empty() {
    let fetcher = Arc::new(GraphFetcher::default().page("https://a.com/", &[]));
    let crawler = crawler(&fetcher, CrawlerConfig::new(0, 1, 1, 1));

    let report = crawler.crawl("https://a.com/", 0).await.unwrap();

    assert!(report.is_empty());
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_panicking_fetch_does_not_stall_crawl() {
    let fetcher = Arc::new(
        GraphFetcher::default()
            .page("https://a.com/", &["https://a.com/boom", "https://a.com/ok"])
            .panicking_page("https://a.com/boom")
            .page("https://a.com/ok", &[]),
    );
    let crawler = crawler(&fetcher, CrawlerConfig::new(2, 1, 1, 2));

    let report = tokio::time::timeout(Duration::from_secs(3), crawler.crawl("https://a.com/", 2))
        .await
        .expect("crawl should finish after a fetch panics")
        .unwrap();

    assert_eq!(report.downloaded, vec!["https://a.com/", "https://a.com/ok"]);
    assert!(matches!(
        report.errors["https://a.com/boom"],
        FetchError::Unavailable { .. }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_during_crawl_returns() {
    let mut fetcher = GraphFetcher::default().with_delay(Duration::from_millis(50));
    let mut seed_links = Vec::new();
    for host in 0..20 {
        let pages: Vec<String> = (0..5).map(|i| format!("https://h{}.com/{}", host, i)).collect();
        for page in &pages {
            fetcher = fetcher.page(page, &[]);
        }
        seed_links.extend(pages);
    }
    let link_refs: Vec<&str> = seed_links.iter().map(String::as_str).collect();
    let fetcher = Arc::new(fetcher.page("https://seed.com/", &link_refs));

    let crawler = Arc::new(crawler(&fetcher, CrawlerConfig::new(2, 4, 2, 1)));
    let closer = Arc::clone(&crawler);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(120)).await;
        closer.close();
    });

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        crawler.crawl("https://seed.com/", 2),
    )
    .await
    .expect("crawl should return once the crawler is closed")
    .unwrap();

    assert!(report.is_downloaded("https://seed.com/"));
    assert!(report.downloaded.len() < 101);
    for url in report.errors.keys() {
        assert!(!report.is_downloaded(url));
    }
}
