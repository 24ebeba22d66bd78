//! HTML link extraction
//!
//! This module turns a fetched HTML page into the list of addresses it links
//! to, resolved against the page's final URL.

use crate::crawler::fetcher::Document;
use crate::ExtractionError;
use scraper::{Html, Selector};
use url::Url;

/// A fetched page as returned by `HttpFetcher`
///
/// Parsing is deferred to `extract_links` so it runs on the extraction pool
/// rather than inside the download.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    url: Url,
    content_type: String,
    body: String,
}

impl HtmlDocument {
    /// Creates a document from a response
    pub fn new(url: Url, content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url,
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// Whether the response declared an HTML body
    pub fn is_html(&self) -> bool {
        let content_type = self.content_type.to_ascii_lowercase();
        content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
    }
}

impl Document for HtmlDocument {
    fn extract_links(&self) -> Result<Vec<String>, ExtractionError> {
        if !self.is_html() {
            return Err(ExtractionError::NotHtml {
                url: self.url.to_string(),
                content_type: self.content_type.clone(),
            });
        }

        parse_links(&self.body, &self.url)
    }
}

/// Parses HTML content and extracts links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
/// - Anything that is not http(s) after resolution
///
/// # Example
///
/// ```
/// use webcrawler::crawler::parse_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = parse_links(html, &base_url).unwrap();
/// assert_eq!(links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_links(html: &str, base_url: &Url) -> Result<Vec<String>, ExtractionError> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    let anchors = selector("a[href]", base_url)?;
    for element in document.select(&anchors) {
        if element.value().attr("download").is_some() {
            continue;
        }

        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, base_url) {
                links.push(absolute_url);
            }
        }
    }

    let canonical = selector("link[rel='canonical'][href]", base_url)?;
    for element in document.select(&canonical) {
        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, base_url) {
                links.push(absolute_url);
            }
        }
    }

    Ok(links)
}

fn selector(css: &str, base_url: &Url) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Parse {
        url: base_url.to_string(),
        message: e.to_string(),
    })
}

/// Resolves a link href to an absolute URL and validates it
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
