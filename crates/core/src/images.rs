//! Image policy selection and content-addressed image naming.
//!
//! One [`ImagePolicy`] is chosen per conversion run and applied to every image
//! in the article:
//!
//! - `url` keeps the remote reference untouched,
//! - `save` persists the raw bytes next to the Markdown file under a name
//!   derived from a digest of the bytes,
//! - `base64` embeds the payload in the Markdown as a numbered reference.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Mp2mdError;

/// Extension used when none can be read from an image source.
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// Image files to persist, keyed by file name.
pub type ImageFiles = BTreeMap<String, Vec<u8>>;

/// How images are represented in the converted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImagePolicy {
    /// Keep the original image URL.
    Url,
    /// Save image files next to the Markdown output.
    Save,
    /// Embed images as base64 data.
    #[default]
    Base64,
}

impl FromStr for ImagePolicy {
    type Err = Mp2mdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "url" | "u" => Ok(Self::Url),
            "save" | "s" => Ok(Self::Save),
            "base64" | "b" => Ok(Self::Base64),
            _ => Err(Mp2mdError::InvalidImagePolicy(s.to_string())),
        }
    }
}

impl fmt::Display for ImagePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImagePolicy::Url => "url",
            ImagePolicy::Save => "save",
            ImagePolicy::Base64 => "base64",
        };
        f.write_str(name)
    }
}

/// Reads the file extension from the last path segment of an image source.
///
/// Query string and fragment are ignored. Falls back to
/// [`DEFAULT_IMAGE_EXTENSION`] when the segment has no usable extension.
pub fn image_extension(src: &str) -> &str {
    let path = src.split(['?', '#']).next().unwrap_or_default();
    let file_name = path.rsplit('/').next().unwrap_or_default();

    match file_name.rfind('.') {
        Some(idx) if idx > 0 => {
            let ext = &file_name[idx + 1..];
            if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                ext
            } else {
                DEFAULT_IMAGE_EXTENSION
            }
        }
        _ => DEFAULT_IMAGE_EXTENSION,
    }
}

/// Hex digest naming an image payload: the leading 128 bits of its SHA-256.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..16])
}

/// Content-addressed file name for an image: `<hash>.<ext>`.
///
/// Identical payloads always map to the same name, whatever their source.
pub fn image_file_name(src: &str, bytes: &[u8]) -> String {
    format!("{}.{}", content_hash(bytes), image_extension(src))
}
