//! Fetching collaborators
//!
//! This module defines the seam between the crawl engine and the network:
//! - `Fetcher`: retrieves a `Document` for an address
//! - `Document`: yields the outbound links of fetched content
//! - `HttpFetcher`: the production fetcher built on reqwest

use crate::config::{HttpConfig, UserAgentConfig};
use crate::crawler::parser::HtmlDocument;
use crate::{ExtractionError, FetchError};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use std::time::Duration;

/// Fetched content that can be searched for links
///
/// `extract_links` may be CPU heavy; the engine runs it on the extraction
/// pool, off the async worker threads.
pub trait Document: Send {
    /// Extracts the absolute addresses this document links to
    fn extract_links(&self) -> Result<Vec<String>, ExtractionError>;
}

/// Retrieves documents by address
///
/// Called concurrently from many download tasks.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url`, returning its document or the reason it failed
    async fn fetch(&self, url: &str) -> Result<Box<dyn Document>, FetchError>;
}

/// Fetcher that downloads pages over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher with a configured HTTP client
    ///
    /// # Example
    ///
    /// ```no_run
    /// use webcrawler::config::{HttpConfig, UserAgentConfig};
    /// use webcrawler::HttpFetcher;
    ///
    /// let fetcher = HttpFetcher::new(&UserAgentConfig::default(), &HttpConfig::default()).unwrap();
    /// ```
    pub fn new(user_agent: &UserAgentConfig, http: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent, http)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Box<dyn Document>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, e))?;

        tracing::trace!("Fetched {} ({} bytes, {})", url, body.len(), content_type);

        Ok(Box::new(HtmlDocument::new(final_url, content_type, body)))
    }
}

/// Builds an HTTP client with proper configuration
///
/// User agent format: `Name/Version (+ContactURL)`. Redirects are followed
/// with reqwest's default policy; links are resolved against the final URL.
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    http: &HttpConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(http.timeout_secs))
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
