//! Cosmetic renaming of dated article directories.
//!
//! Saved articles often land in folders like `2023-05-01 "Some 标题!"`. The
//! normalized name keeps the date prefix followed by the Han characters of
//! the remainder only: `2023-05-01标题`.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use unicode_script::{Script, UnicodeScript};

use crate::batch::list_subdirectories;
use crate::{Mp2mdError, Result};

static DATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})").unwrap());

/// Computes the normalized name, or `None` when `name` has no date prefix.
pub fn normalized_dir_name(name: &str) -> Option<String> {
    let date = DATE_PREFIX.captures(name)?.get(1)?;
    let rest = name[date.end()..].trim().replace(['"', '\''], "");

    let han: String = rest.chars().filter(|c| c.script() == Script::Han).collect();
    Some(format!("{}{}", date.as_str(), han))
}

/// Renames every dated subdirectory of `base` to its normalized name.
///
/// Directories without a date prefix, already normalized directories and
/// renames whose target exists are skipped. Returns the number of renames.
pub fn rename_directories(base: &Path) -> Result<usize> {
    let mut renamed = 0;

    for dir in list_subdirectories(base)? {
        let Some(name) = dir.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(new_name) = normalized_dir_name(name) else {
            tracing::debug!(dir = name, "no date prefix, skipping");
            continue;
        };
        if new_name == name {
            continue;
        }

        let target = base.join(&new_name);
        if target.exists() {
            tracing::warn!(from = name, to = %new_name, "target already exists, skipping rename");
            continue;
        }

        match fs::rename(&dir, &target) {
            Ok(()) => {
                tracing::info!(from = name, to = %new_name, "renamed directory");
                renamed += 1;
            }
            Err(source) => {
                let err = Mp2mdError::FileWrite { path: target, source };
                tracing::warn!(from = name, "failed to rename directory: {}", err);
            }
        }
    }

    Ok(renamed)
}
