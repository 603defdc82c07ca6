//! Content fetching from URLs and files.
//!
//! This module provides functions for retrieving article HTML from
//! HTTP/HTTPS URLs and local files, plus raw bytes for images referenced
//! by an article.

use std::fs;
use std::path::Path;
#[cfg(feature = "fetch")]
use std::time::Duration;

#[cfg(feature = "fetch")]
use reqwest::Client;
use url::Url;

use crate::{Mp2mdError, Result};

/// HTTP client configuration for fetching pages and images.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/124.0 Safari/537.36 mp2md/1.0"
                .to_string(),
        }
    }
}

#[cfg(feature = "fetch")]
impl FetchConfig {
    /// Builds a reqwest client honouring the timeout and User-Agent.
    pub fn client(&self) -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout))
            .user_agent(&self.user_agent)
            .build()
            .map_err(Mp2mdError::HttpError)
    }
}

/// Parses and checks an http(s) URL.
pub fn parse_http_url(url: &str) -> Result<Url> {
    let parsed_url = Url::parse(url).map_err(|e| Mp2mdError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed_url.scheme(), "http" | "https") {
        return Err(Mp2mdError::InvalidUrl(format!(
            "URL must use http:// or https://, got {}",
            parsed_url.scheme()
        )));
    }

    Ok(parsed_url)
}

/// Fetches HTML content from a URL.
///
/// Follows redirects and fails on a non-success status.
#[cfg(feature = "fetch")]
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = parse_http_url(url)?;
    let client = config.client()?;

    let response = client
        .get(parsed_url)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8")
        .send()
        .await
        .map_err(|e| map_send_error(e, config))?
        .error_for_status()?;

    let content = response.text().await?;

    Ok(content)
}

/// Fetches raw bytes from a URL with an existing client.
#[cfg(feature = "fetch")]
pub async fn fetch_bytes(client: &Client, url: &str, config: &FetchConfig) -> Result<Vec<u8>> {
    let parsed_url = parse_http_url(url)?;

    let response = client
        .get(parsed_url)
        .header("Accept", "image/avif,image/webp,image/apng,image/*,*/*;q=0.8")
        .send()
        .await
        .map_err(|e| map_send_error(e, config))?
        .error_for_status()?;

    Ok(response.bytes().await?.to_vec())
}

#[cfg(feature = "fetch")]
fn map_send_error(err: reqwest::Error, config: &FetchConfig) -> Mp2mdError {
    if err.is_timeout() { Mp2mdError::Timeout { timeout: config.timeout } } else { Mp2mdError::HttpError(err) }
}

/// Reads HTML content from a local file.
///
/// Invalid UTF-8 sequences are replaced rather than rejected, since saved
/// pages are not always cleanly encoded.
pub fn fetch_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Mp2mdError::FileNotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|source| Mp2mdError::ReadError { path: path.to_path_buf(), source })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
