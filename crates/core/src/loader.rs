//! Loading image payloads and applying an image policy to an article.
//!
//! The parser always emits images as remote references. Before rendering,
//! [`apply_image_policy`] rewrites the tree so that every image has the shape
//! the chosen policy requires: raw bytes for `save`, an `ImageBase64` piece for
//! `base64`, and the untouched reference for `url`.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;

use crate::fetch::{FetchConfig, fetch_bytes};
use crate::images::ImagePolicy;
use crate::piece::{Article, Piece, PieceKind, PieceValue};
use crate::{Mp2mdError, Result};

/// Loads image bytes from data URIs, http(s) URLs, or paths under a base directory.
#[derive(Debug, Clone)]
pub struct ImageLoader {
    client: Client,
    config: FetchConfig,
    base_dir: Option<PathBuf>,
}

impl ImageLoader {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self { client: config.client()?, config: config.clone(), base_dir: None })
    }

    /// Directory that relative image paths are resolved against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Loads the payload referenced by `src`.
    ///
    /// Local files are only read when a base directory is set, and only
    /// through relative paths that stay inside it. Pages fetched from the
    /// network can therefore reference nothing but data URIs and http(s).
    pub async fn load(&self, src: &str) -> Result<Vec<u8>> {
        if let Some(data) = src.strip_prefix("data:") {
            return decode_data_uri(data);
        }

        if src.starts_with("http://") || src.starts_with("https://") {
            return fetch_bytes(&self.client, src, &self.config).await;
        }

        let path = self.local_path(src)?;
        tokio::fs::read(&path)
            .await
            .map_err(|source| Mp2mdError::ReadError { path, source })
    }

    fn local_path(&self, src: &str) -> Result<PathBuf> {
        let Some(dir) = self.base_dir() else {
            return Err(Mp2mdError::UnsafeImageSource(src.to_string()));
        };

        let relative = Path::new(src);
        let contained = !src.to_ascii_lowercase().starts_with("file:")
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !contained {
            return Err(Mp2mdError::UnsafeImageSource(src.to_string()));
        }

        Ok(dir.join(relative))
    }
}

/// Decodes the part of a data URI after `data:`.
fn decode_data_uri(data: &str) -> Result<Vec<u8>> {
    let (meta, payload) = data
        .split_once(',')
        .ok_or_else(|| Mp2mdError::ImageDecode("data URI without payload".to_string()))?;

    if meta.ends_with(";base64") {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD.decode(compact).map_err(|e| Mp2mdError::ImageDecode(e.to_string()))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

/// Rewrites the article's images into the shape `policy` requires.
///
/// Each distinct source is loaded once, in document order. Images that fail
/// to load are logged and kept as remote references.
pub async fn apply_image_policy(article: Article, policy: ImagePolicy, loader: &ImageLoader) -> Article {
    if policy == ImagePolicy::Url {
        return article;
    }

    let mut sources = Vec::new();
    collect_image_sources(&article.content, &mut sources);

    let mut payloads = HashMap::new();
    for src in sources {
        match loader.load(&src).await {
            Ok(bytes) => {
                tracing::debug!(src = %src, size = bytes.len(), "loaded image");
                payloads.insert(src, bytes);
            }
            Err(err) => tracing::warn!(src = %src, "keeping image as a link, failed to load it: {}", err),
        }
    }

    let content = article
        .content
        .into_iter()
        .map(|piece| attach_payload(piece, policy, &payloads))
        .collect();

    Article::new(article.title, content)
}

fn collect_image_sources(pieces: &[Piece], sources: &mut Vec<String>) {
    for piece in pieces {
        match (&piece.kind, &piece.value) {
            (PieceKind::Image, PieceValue::None) => {
                let src = piece.attr("src");
                if !src.is_empty() && !sources.iter().any(|seen| seen == src) {
                    sources.push(src.to_string());
                }
            }
            (kind, PieceValue::Pieces(children)) if kind.is_container() => collect_image_sources(children, sources),
            _ => {}
        }
    }
}

fn attach_payload(piece: Piece, policy: ImagePolicy, payloads: &HashMap<String, Vec<u8>>) -> Piece {
    let Piece { kind, value, attrs } = piece;

    match (kind, value) {
        (PieceKind::Image, PieceValue::None) => {
            let src = attrs.get("src").map(String::as_str).unwrap_or_default();
            let value = match (policy, payloads.get(src)) {
                (ImagePolicy::Save, Some(bytes)) => PieceValue::Bytes(bytes.clone()),
                (ImagePolicy::Base64, Some(bytes)) => {
                    let alt = attrs.get("alt").map(String::as_str).unwrap_or_default();
                    return Piece::image_base64(alt, STANDARD.encode(bytes));
                }
                _ => PieceValue::None,
            };
            Piece { kind, value, attrs }
        }
        (kind, PieceValue::Pieces(children)) if kind.is_container() => {
            let children = children
                .into_iter()
                .map(|child| attach_payload(child, policy, payloads))
                .collect();
            Piece { kind, value: PieceValue::Pieces(children), attrs }
        }
        (kind, value) => Piece { kind, value, attrs },
    }
}
