use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the host from an address
///
/// The address is parsed with the `url` crate and its host is lowercased.
/// The host is only used as a grouping key for per-host admission, so the
/// port is deliberately not part of it.
///
/// # Arguments
///
/// * `address` - The absolute URL to extract the host from
///
/// # Returns
///
/// * `Ok(String)` - The lowercase host
/// * `Err(UrlError)` - The address is not a valid absolute URL or has no host
///
/// # Examples
///
/// ```
/// use webcrawler::url::extract_host;
///
/// assert_eq!(extract_host("https://example.com/path").unwrap(), "example.com");
/// assert_eq!(extract_host("https://EXAMPLE.COM/path").unwrap(), "example.com");
/// assert!(extract_host("not a url").is_err());
/// ```
pub fn extract_host(address: &str) -> UrlResult<String> {
    let url = Url::parse(address).map_err(|e| UrlError::Parse {
        url: address.to_string(),
        message: e.to_string(),
    })?;

    url.host_str()
        .map(|h| h.to_lowercase())
        .ok_or_else(|| UrlError::MissingHost(address.to_string()))
}
