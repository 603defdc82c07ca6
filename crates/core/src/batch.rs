//! Batch conversion of a directory holding one subdirectory per article.
//!
//! Each subdirectory is converted independently and in name order. A failure
//! in one article is logged and the batch moves on; only problems with the
//! base directory itself are returned as errors.

use std::fs;
use std::path::{Path, PathBuf};

use crate::convert::{read_article, save_text};
use crate::{Mp2mdError, Result};

#[cfg(feature = "fetch")]
use crate::convert::{ConvertConfig, save_markdown};
#[cfg(feature = "fetch")]
use crate::loader::{ImageLoader, apply_image_policy};

/// File name preferred when a subdirectory holds several pages.
pub const INDEX_FILE: &str = "index.html";

/// Lists the immediate subdirectories of `base`, sorted by name.
pub fn list_subdirectories(base: &Path) -> Result<Vec<PathBuf>> {
    fs::metadata(base).map_err(|source| Mp2mdError::PathAccess { path: base.to_path_buf(), source })?;

    let entries = fs::read_dir(base).map_err(|source| Mp2mdError::DirectoryRead { path: base.to_path_buf(), source })?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Mp2mdError::DirectoryRead { path: base.to_path_buf(), source })?;
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            dirs.push(entry.path());
        }
    }

    dirs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(dirs)
}

/// Lists `.htm`/`.html` files in `dir` (case-insensitive), sorted by name.
pub fn find_html_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| Mp2mdError::DirectoryRead { path: dir.to_path_buf(), source })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.path())
        .filter(|path| is_html_file(path))
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn is_html_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

/// Picks the page to convert: `index.html` when present, else the first file.
pub fn select_html_file(files: &[PathBuf]) -> Option<&PathBuf> {
    files
        .iter()
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.eq_ignore_ascii_case(INDEX_FILE))
        })
        .or_else(|| files.first())
}

/// Finds the page to convert in an article directory.
fn article_page(dir: &Path) -> Result<Option<PathBuf>> {
    let files = find_html_files(dir)?;
    Ok(select_html_file(&files).cloned())
}

/// Converts every article subdirectory of `base` to Markdown.
///
/// The Markdown and any saved images are written into the article's own
/// subdirectory. Returns the number of articles converted.
#[cfg(feature = "fetch")]
pub async fn batch_convert(base: &Path, config: &ConvertConfig) -> Result<usize> {
    let dirs = list_subdirectories(base)?;
    let loader = ImageLoader::new(&config.fetch)?;
    let mut converted = 0;

    for dir in dirs {
        match convert_dir_to_markdown(&dir, config, &loader).await {
            Ok(Some(path)) => {
                tracing::info!(dir = %dir.display(), output = %path.display(), "converted article");
                converted += 1;
            }
            Ok(None) => tracing::info!(dir = %dir.display(), "no HTML file found, skipping"),
            Err(err) => tracing::warn!(dir = %dir.display(), "failed to convert article: {}", err),
        }
    }

    tracing::info!(converted, "batch conversion finished");
    Ok(converted)
}

#[cfg(feature = "fetch")]
async fn convert_dir_to_markdown(dir: &Path, config: &ConvertConfig, loader: &ImageLoader) -> Result<Option<PathBuf>> {
    let Some(page) = article_page(dir)? else {
        return Ok(None);
    };

    tracing::debug!(page = %page.display(), "converting");
    let article = read_article(&page)?;
    let loader = loader.clone().with_base_dir(dir);
    let article = apply_image_policy(article, config.image_policy, &loader).await;

    save_markdown(&article, dir).map(Some)
}

/// Converts every article subdirectory of `base` to plain text.
///
/// Returns the number of articles converted.
pub fn batch_convert_to_text(base: &Path) -> Result<usize> {
    let dirs = list_subdirectories(base)?;
    let mut converted = 0;

    for dir in dirs {
        match convert_dir_to_text(&dir) {
            Ok(Some(path)) => {
                tracing::info!(dir = %dir.display(), output = %path.display(), "converted article");
                converted += 1;
            }
            Ok(None) => tracing::info!(dir = %dir.display(), "no HTML file found, skipping"),
            Err(err) => tracing::warn!(dir = %dir.display(), "failed to convert article: {}", err),
        }
    }

    tracing::info!(converted, "batch conversion finished");
    Ok(converted)
}

fn convert_dir_to_text(dir: &Path) -> Result<Option<PathBuf>> {
    let Some(page) = article_page(dir)? else {
        return Ok(None);
    };

    let article = read_article(&page)?;
    save_text(&article, dir).map(Some)
}
