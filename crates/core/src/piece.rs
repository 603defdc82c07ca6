//! Document model produced by parsing and consumed by the formatters.
//!
//! An [`Article`] is a title [`Piece`] plus an ordered list of content pieces.
//! Each piece carries a [`PieceKind`] tag, a [`PieceValue`] and a string
//! attribute map. The kind decides which value shape is meaningful:
//!
//! | kind | value | attributes |
//! |---|---|---|
//! | `Header` | `Text` | `level` |
//! | `Link` | `Text` | `href` |
//! | `NormalText`, `BoldText`, `ItalicText`, `BoldItalicText` | `Text` | |
//! | `Image` | `None` (remote reference) or `Bytes` (persist to file) | `src`, `alt` |
//! | `ImageBase64` | `Text` (base64 payload) | `alt` |
//! | `Table` | `Text` (pre-rendered markup) | `type` |
//! | `CodeBlock` | `Lines` | |
//! | `BlockQuotes`, `OList`, `UList` | `Pieces` | |
//! | `Br`, `Null` | `None` | |
//!
//! The typed accessors (`as_text`, `as_lines`, ...) return a [`ShapeMismatch`]
//! when the value does not have the requested shape, so formatters can fail
//! soft on a malformed tree instead of panicking.
//!
//! # Example
//!
//! ```rust
//! use mp2md_core::{Article, Piece};
//!
//! let article = Article::new(
//!     Piece::header(1, "Title"),
//!     vec![Piece::normal_text("hello "), Piece::bold_text("world")],
//! );
//! assert_eq!(article.title_text(), "Title");
//! ```

use std::collections::BTreeMap;
use thiserror::Error;

/// Closed set of piece kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Header,
    Link,
    NormalText,
    BoldText,
    ItalicText,
    BoldItalicText,
    Image,
    ImageBase64,
    Table,
    CodeBlock,
    BlockQuotes,
    OList,
    UList,
    Br,
    Null,
}

impl PieceKind {
    /// Whether pieces of this kind hold nested pieces.
    pub fn is_container(self) -> bool {
        matches!(self, PieceKind::BlockQuotes | PieceKind::OList | PieceKind::UList)
    }
}

/// Value carried by a piece. Its meaning depends on the piece kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PieceValue {
    #[default]
    None,
    Text(String),
    Bytes(Vec<u8>),
    Lines(Vec<String>),
    Pieces(Vec<Piece>),
}

impl PieceValue {
    /// Short name of the value shape, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            PieceValue::None => "none",
            PieceValue::Text(_) => "text",
            PieceValue::Bytes(_) => "bytes",
            PieceValue::Lines(_) => "lines",
            PieceValue::Pieces(_) => "pieces",
        }
    }
}

/// A piece's value did not have the shape its kind requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind:?} piece expected a {expected} value but holds {found}")]
pub struct ShapeMismatch {
    pub kind: PieceKind,
    pub expected: &'static str,
    pub found: &'static str,
}

/// One node of the article tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub value: PieceValue,
    pub attrs: BTreeMap<String, String>,
}

impl Piece {
    pub fn new(kind: PieceKind, value: PieceValue) -> Self {
        Self { kind, value, attrs: BTreeMap::new() }
    }

    /// Adds an attribute, replacing any previous value for `key`.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn header(level: u8, text: impl Into<String>) -> Self {
        Self::new(PieceKind::Header, PieceValue::Text(text.into())).with_attr("level", level.to_string())
    }

    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self::new(PieceKind::Link, PieceValue::Text(text.into())).with_attr("href", href)
    }

    pub fn normal_text(text: impl Into<String>) -> Self {
        Self::new(PieceKind::NormalText, PieceValue::Text(text.into()))
    }

    pub fn bold_text(text: impl Into<String>) -> Self {
        Self::new(PieceKind::BoldText, PieceValue::Text(text.into()))
    }

    pub fn italic_text(text: impl Into<String>) -> Self {
        Self::new(PieceKind::ItalicText, PieceValue::Text(text.into()))
    }

    pub fn bold_italic_text(text: impl Into<String>) -> Self {
        Self::new(PieceKind::BoldItalicText, PieceValue::Text(text.into()))
    }

    /// Image rendered as a reference to its original source.
    pub fn image(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self::new(PieceKind::Image, PieceValue::None)
            .with_attr("src", src)
            .with_attr("alt", alt)
    }

    /// Image whose bytes are persisted next to the Markdown output.
    pub fn image_bytes(src: impl Into<String>, alt: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(PieceKind::Image, PieceValue::Bytes(bytes))
            .with_attr("src", src)
            .with_attr("alt", alt)
    }

    /// Image embedded in the output as a base64 reference definition.
    pub fn image_base64(alt: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::new(PieceKind::ImageBase64, PieceValue::Text(payload.into())).with_attr("alt", alt)
    }

    /// Table whose Markdown has already been produced by the parser.
    pub fn native_table(markup: impl Into<String>) -> Self {
        Self::new(PieceKind::Table, PieceValue::Text(markup.into())).with_attr("type", "native")
    }

    pub fn code_block(lines: Vec<String>) -> Self {
        Self::new(PieceKind::CodeBlock, PieceValue::Lines(lines))
    }

    pub fn block_quote(pieces: Vec<Piece>) -> Self {
        Self::new(PieceKind::BlockQuotes, PieceValue::Pieces(pieces))
    }

    /// One ordered-list item holding the item's pieces.
    pub fn ordered_list(pieces: Vec<Piece>) -> Self {
        Self::new(PieceKind::OList, PieceValue::Pieces(pieces))
    }

    /// One unordered-list item holding the item's pieces.
    pub fn unordered_list(pieces: Vec<Piece>) -> Self {
        Self::new(PieceKind::UList, PieceValue::Pieces(pieces))
    }

    pub fn br() -> Self {
        Self::new(PieceKind::Br, PieceValue::None)
    }

    pub fn null() -> Self {
        Self::new(PieceKind::Null, PieceValue::None)
    }

    /// Attribute value, or the empty string when absent.
    pub fn attr(&self, key: &str) -> &str {
        self.attrs.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn as_text(&self) -> Result<&str, ShapeMismatch> {
        match &self.value {
            PieceValue::Text(text) => Ok(text),
            other => Err(self.mismatch("text", other)),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8], ShapeMismatch> {
        match &self.value {
            PieceValue::Bytes(bytes) => Ok(bytes),
            other => Err(self.mismatch("bytes", other)),
        }
    }

    pub fn as_lines(&self) -> Result<&[String], ShapeMismatch> {
        match &self.value {
            PieceValue::Lines(lines) => Ok(lines),
            other => Err(self.mismatch("lines", other)),
        }
    }

    pub fn as_pieces(&self) -> Result<&[Piece], ShapeMismatch> {
        match &self.value {
            PieceValue::Pieces(pieces) => Ok(pieces),
            other => Err(self.mismatch("pieces", other)),
        }
    }

    fn mismatch(&self, expected: &'static str, found: &PieceValue) -> ShapeMismatch {
        ShapeMismatch { kind: self.kind, expected, found: found.shape() }
    }
}

/// A parsed article: a title piece and the body pieces in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: Piece,
    pub content: Vec<Piece>,
}

impl Article {
    pub fn new(title: Piece, content: Vec<Piece>) -> Self {
        Self { title, content }
    }

    /// Trimmed title text, empty when the title piece holds no text.
    pub fn title_text(&self) -> &str {
        self.title.as_text().map(str::trim).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_kind_and_attrs() {
        let header = Piece::header(3, "Section");
        assert_eq!(header.kind, PieceKind::Header);
        assert_eq!(header.attr("level"), "3");
        assert_eq!(header.as_text(), Ok("Section"));

        let link = Piece::link("docs", "https://example.com");
        assert_eq!(link.attr("href"), "https://example.com");

        let table = Piece::native_table("| a |");
        assert_eq!(table.attr("type"), "native");
    }

    #[test]
    fn test_missing_attr_is_empty() {
        let piece = Piece::normal_text("plain");
        assert_eq!(piece.attr("href"), "");
    }

    #[test]
    fn test_accessor_reports_mismatch() {
        let piece = Piece::new(PieceKind::CodeBlock, PieceValue::Text("oops".to_string()));
        let err = piece.as_lines().unwrap_err();
        assert_eq!(err.kind, PieceKind::CodeBlock);
        assert_eq!(err.expected, "lines");
        assert_eq!(err.found, "text");
        assert!(err.to_string().contains("CodeBlock"));
    }

    #[test]
    fn test_container_kinds() {
        assert!(PieceKind::BlockQuotes.is_container());
        assert!(PieceKind::OList.is_container());
        assert!(PieceKind::UList.is_container());
        assert!(!PieceKind::Image.is_container());
        assert!(!PieceKind::CodeBlock.is_container());
    }

    #[test]
    fn test_title_text_is_trimmed() {
        let article = Article::new(Piece::header(1, "  Spaced Title \n"), vec![]);
        assert_eq!(article.title_text(), "Spaced Title");
    }

    #[test]
    fn test_title_text_with_wrong_shape() {
        let article = Article::new(Piece::new(PieceKind::Header, PieceValue::None), vec![]);
        assert_eq!(article.title_text(), "");
    }
}
