//! Error types for mp2md operations.
//!
//! This module defines the main error type [`Mp2mdError`] which represents
//! everything that can go wrong while fetching, parsing, converting and
//! persisting articles. Rendering itself never fails: a piece whose value
//! does not fit its kind is reported as a [`ShapeMismatch`](crate::piece::ShapeMismatch)
//! and rendered as an empty string.
//!
//! # Example
//!
//! ```rust
//! use mp2md_core::{Mp2mdError, Result};
//!
//! fn require_html(html: &str) -> Result<&str> {
//!     if html.is_empty() {
//!         return Err(Mp2mdError::HtmlParseError("empty document".to_string()));
//!     }
//!     Ok(html)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for conversion operations.
#[derive(Error, Debug)]
pub enum Mp2mdError {
    /// HTTP request errors from reqwest.
    ///
    /// Wraps network errors, DNS failures, connection issues and
    /// non-success status codes.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing errors, usually an invalid CSS selector.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// A base or target path is missing or cannot be inspected.
    #[error("Path does not exist or is not accessible: {}: {source}", path.display())]
    PathAccess { path: PathBuf, source: std::io::Error },

    /// Listing a directory failed.
    #[error("Failed to read directory {}: {source}", path.display())]
    DirectoryRead { path: PathBuf, source: std::io::Error },

    /// Reading an input file failed.
    #[error("Failed to read file {}: {source}", path.display())]
    ReadError { path: PathBuf, source: std::io::Error },

    /// Persisting Markdown, text or image output failed.
    #[error("Failed to write to file {}: {source}", path.display())]
    FileWrite { path: PathBuf, source: std::io::Error },

    /// An embedded image payload could not be decoded.
    #[error("Failed to decode image data: {0}")]
    ImageDecode(String),

    /// An image source that may not be read in the current mode, such as a
    /// local path referenced by a fetched page.
    #[error("Refusing to load image source: {0}")]
    UnsafeImageSource(String),

    /// Unknown image policy name.
    #[error("Invalid image policy: {0}. Valid options: url, save, base64")]
    InvalidImagePolicy(String),
}

/// Result type alias for Mp2mdError.
pub type Result<T> = std::result::Result<T, Mp2mdError>;
