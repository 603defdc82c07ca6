//! Single-article conversion: parse, render and persist.
//!
//! The async entry points load images according to the configured
//! [`ImagePolicy`] before rendering. Text conversion never touches images and
//! is available without the `fetch` feature.
//!
//! # Example
//!
//! ```rust,no_run
//! use mp2md_core::{ConvertConfig, ImagePolicy, convert_file_to_markdown};
//! use std::path::Path;
//!
//! # async fn run() -> mp2md_core::Result<()> {
//! let config = ConvertConfig::builder().image_policy(ImagePolicy::Save).timeout(10).build();
//! let written = convert_file_to_markdown(Path::new("article/index.html"), Path::new("out"), &config).await?;
//! println!("{}", written.display());
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::fetch::{FetchConfig, fetch_file};
use crate::formatters::{RenderedMarkdown, extract_text, render_markdown};
use crate::images::{ImageFiles, ImagePolicy};
use crate::parse::parse_article;
use crate::piece::Article;
use crate::{Mp2mdError, Result};

#[cfg(feature = "fetch")]
use crate::fetch::{fetch_url, parse_http_url};
#[cfg(feature = "fetch")]
use crate::loader::{ImageLoader, apply_image_policy};

/// Extension of Markdown output files.
pub const MARKDOWN_EXTENSION: &str = "md";
/// Extension of plain text output files.
pub const TEXT_EXTENSION: &str = "txt";

/// File stem used when an article has no usable title.
const UNTITLED: &str = "untitled";

/// Configuration for a conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConvertConfig {
    /// How images are represented in Markdown output.
    pub image_policy: ImagePolicy,
    /// HTTP settings for pages and images.
    pub fetch: FetchConfig,
}

impl ConvertConfig {
    /// Creates a new builder for ConvertConfig.
    pub fn builder() -> ConvertConfigBuilder {
        ConvertConfigBuilder::new()
    }
}

/// Builder for ConvertConfig.
///
/// # Example
///
/// ```rust
/// use mp2md_core::{ConvertConfig, ImagePolicy};
///
/// let config = ConvertConfig::builder()
///     .image_policy(ImagePolicy::Url)
///     .timeout(5)
///     .build();
///
/// assert_eq!(config.image_policy, ImagePolicy::Url);
/// assert_eq!(config.fetch.timeout, 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConvertConfigBuilder {
    config: ConvertConfig,
}

impl ConvertConfigBuilder {
    pub fn new() -> Self {
        Self { config: ConvertConfig::default() }
    }

    pub fn image_policy(mut self, policy: ImagePolicy) -> Self {
        self.config.image_policy = policy;
        self
    }

    /// Sets the HTTP timeout in seconds.
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.config.fetch.timeout = seconds;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.fetch.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> ConvertConfig {
        self.config
    }
}

/// Derives an output file name from an article title.
///
/// Path separators, characters Windows rejects and control characters are
/// replaced with `_`.
pub fn output_file_name(title: &str, extension: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let stem = match stem.as_str() {
        "" | "." | ".." => UNTITLED,
        _ => stem.as_str(),
    };

    format!("{stem}.{extension}")
}

/// Resolves where the output for an article titled `title` goes.
///
/// An existing directory receives `<title>.<extension>`; a path already ending
/// in `.<extension>` is used as is; anything else is created as a directory.
pub fn resolve_output_path(output: &Path, title: &str, extension: &str) -> Result<PathBuf> {
    if output.is_dir() {
        return Ok(output.join(output_file_name(title, extension)));
    }

    let has_extension = output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));

    if has_extension {
        if let Some(parent) = output.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir(parent)?;
        }
        return Ok(output.to_path_buf());
    }

    create_dir(output)?;
    Ok(output.join(output_file_name(title, extension)))
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| Mp2mdError::FileWrite { path: dir.to_path_buf(), source })
}

/// Writes rendered Markdown to `path` and its images next to it.
///
/// Image write failures are logged and do not fail the article. Returns the
/// number of image files written.
pub fn write_markdown(path: &Path, rendered: &RenderedMarkdown) -> Result<usize> {
    fs::write(path, &rendered.markdown).map_err(|source| Mp2mdError::FileWrite { path: path.to_path_buf(), source })?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(write_images(dir, &rendered.images))
}

/// Writes every image file into `dir`, logging failures.
pub fn write_images(dir: &Path, images: &ImageFiles) -> usize {
    let mut written = 0;

    for (name, bytes) in images {
        let path = dir.join(name);
        match fs::write(&path, bytes) {
            Ok(()) => written += 1,
            Err(err) => tracing::warn!(path = %path.display(), "failed to write image: {}", err),
        }
    }

    written
}

/// Writes extracted text to `path`.
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(|source| Mp2mdError::FileWrite { path: path.to_path_buf(), source })
}

/// Reads and parses a local HTML file without loading any images.
pub fn read_article(path: &Path) -> Result<Article> {
    let html = fetch_file(path)?;
    parse_article(&html, None)
}

/// Renders an article and saves it under `output`.
pub fn save_markdown(article: &Article, output: &Path) -> Result<PathBuf> {
    let rendered = render_markdown(article);
    let path = resolve_output_path(output, article.title_text(), MARKDOWN_EXTENSION)?;
    let images = write_markdown(&path, &rendered)?;

    tracing::info!(path = %path.display(), images, "wrote markdown");
    Ok(path)
}

/// Extracts an article's text and saves it under `output`.
pub fn save_text(article: &Article, output: &Path) -> Result<PathBuf> {
    let path = resolve_output_path(output, article.title_text(), TEXT_EXTENSION)?;
    write_text(&path, &extract_text(article))?;

    tracing::info!(path = %path.display(), "wrote text");
    Ok(path)
}

/// Fetches a page and parses it, applying the configured image policy.
#[cfg(feature = "fetch")]
pub async fn parse_from_url(url: &str, config: &ConvertConfig) -> Result<Article> {
    let base_url = parse_http_url(url)?;
    let html = fetch_url(url, &config.fetch).await?;
    let article = parse_article(&html, Some(&base_url))?;

    let loader = ImageLoader::new(&config.fetch)?;
    Ok(apply_image_policy(article, config.image_policy, &loader).await)
}

/// Parses a local HTML file, applying the configured image policy.
///
/// Relative image paths are resolved against the file's directory.
#[cfg(feature = "fetch")]
pub async fn parse_from_file(path: &Path, config: &ConvertConfig) -> Result<Article> {
    let article = read_article(path)?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let loader = ImageLoader::new(&config.fetch)?.with_base_dir(base_dir);
    Ok(apply_image_policy(article, config.image_policy, &loader).await)
}

/// Converts the page at `url` to Markdown under `output`.
#[cfg(feature = "fetch")]
pub async fn convert_url_to_markdown(url: &str, output: &Path, config: &ConvertConfig) -> Result<PathBuf> {
    let article = parse_from_url(url, config).await?;
    save_markdown(&article, output)
}

/// Converts a local HTML file to Markdown under `output`.
#[cfg(feature = "fetch")]
pub async fn convert_file_to_markdown(html: &Path, output: &Path, config: &ConvertConfig) -> Result<PathBuf> {
    let article = parse_from_file(html, config).await?;
    save_markdown(&article, output)
}

/// Converts a local HTML file to plain text under `output`.
pub fn convert_file_to_text(html: &Path, output: &Path) -> Result<PathBuf> {
    let article = read_article(html)?;
    save_text(&article, output)
}
