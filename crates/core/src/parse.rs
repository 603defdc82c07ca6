//! HTML parsing into the article piece tree.
//!
//! This module provides the [`Document`] type, a thin wrapper around a parsed
//! `scraper::Html` page, and [`parse_article`], which walks the article body
//! and builds the [`Article`] consumed by the formatters.
//!
//! Captured article pages keep their title in `#activity-name` and their body
//! in `#js_content`; generic pages fall back to `<title>` and `<body>`.
//! Images are always produced in URL shape here; see
//! `loader::apply_image_policy` for attaching payloads.
//!
//! # Example
//!
//! ```rust
//! use mp2md_core::parse::parse_article;
//! use mp2md_core::render_markdown;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1 id="activity-name">Title</h1>
//!             <div id="js_content"><p>Hello <strong>world</strong></p></div>
//!         </body>
//!     </html>
//! "#;
//!
//! let article = parse_article(html, None).unwrap();
//! assert_eq!(article.title_text(), "Title");
//! assert!(render_markdown(&article).markdown.contains("Hello **world**"));
//! ```

use scraper::node::Element;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::piece::{Article, Piece, PieceKind, PieceValue};
use crate::{Mp2mdError, Result};

const TITLE_SELECTORS: [&str; 3] = ["#activity-name", "h1.rich_media_title", ".rich_media_title"];

const CONTENT_SELECTORS: [&str; 3] = ["#js_content", "article", "body"];

const IGNORED_TAGS: [&str; 16] = [
    "script", "style", "noscript", "head", "title", "meta", "link", "svg", "iframe", "button", "input", "select",
    "textarea", "template", "canvas", "video",
];

const BOLD_DECLARATIONS: [&str; 6] = [
    "font-weight:bold",
    "font-weight:bolder",
    "font-weight:600",
    "font-weight:700",
    "font-weight:800",
    "font-weight:900",
];

const BLOCK_TAGS: [&str; 13] = [
    "p",
    "div",
    "section",
    "article",
    "figure",
    "figcaption",
    "header",
    "footer",
    "main",
    "center",
    "dl",
    "dt",
    "dd",
];

/// Represents a parsed HTML page.
pub struct Document {
    html: Html,
    base_url: Option<Url>,
}

impl Document {
    /// Parses HTML from a string.
    pub fn parse(html: &str) -> Result<Self> {
        Ok(Self { html: Html::parse_document(html), base_url: None })
    }

    /// Parses HTML with a base URL used to resolve relative links and images.
    pub fn parse_with_base_url(html: &str, base_url: Option<Url>) -> Result<Self> {
        Ok(Self { html: Html::parse_document(html), base_url })
    }

    /// Gets the base URL used for resolving references, if any.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`Mp2mdError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<ElementRef<'_>>> {
        let sel =
            Selector::parse(selector).map_err(|e| Mp2mdError::HtmlParseError(format!("Invalid selector: {}", e)))?;

        Ok(self.html.select(&sel).collect())
    }

    /// Gets the content of the `<title>` element if present.
    pub fn title(&self) -> Option<String> {
        self.first_text("title")
    }

    /// Gets the article title.
    ///
    /// Tries the article heading first, then `og:title`, then `<title>`.
    /// Returns an empty string when none is present.
    pub fn article_title(&self) -> String {
        for selector in TITLE_SELECTORS {
            if let Some(title) = self.first_text(selector) {
                return title;
            }
        }

        if let Ok(metas) = self.select(r#"meta[property="og:title"]"#)
            && let Some(content) = metas.first().and_then(|meta| meta.value().attr("content"))
        {
            let title = collapse_whitespace(content).trim().to_string();
            if !title.is_empty() {
                return title;
            }
        }

        self.title().unwrap_or_default()
    }

    /// Builds the article tree from the page.
    pub fn to_article(&self) -> Result<Article> {
        let title = self.article_title();
        let builder = PieceBuilder { base_url: self.base_url() };

        let mut content = Vec::new();
        builder.children(self.content_root()?, Scope::default(), &mut content);
        trim_breaks(&mut content);

        Ok(Article::new(Piece::header(1, title), content))
    }

    fn content_root(&self) -> Result<ElementRef<'_>> {
        for selector in CONTENT_SELECTORS {
            if let Some(root) = self.select(selector)?.into_iter().next() {
                return Ok(root);
            }
        }
        Ok(self.html.root_element())
    }

    fn first_text(&self, selector: &str) -> Option<String> {
        let elements = self.select(selector).ok()?;
        let text = collapse_whitespace(&elements.first()?.text().collect::<String>()).trim().to_string();
        if text.is_empty() { None } else { Some(text) }
    }
}

/// Parses an HTML page into an article with URL-shaped images.
pub fn parse_article(html: &str, base_url: Option<&Url>) -> Result<Article> {
    Document::parse_with_base_url(html, base_url.cloned())?.to_article()
}

/// Inherited inline styling while walking the DOM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TextStyle {
    bold: bool,
    italic: bool,
}

impl TextStyle {
    fn kind(self) -> PieceKind {
        match (self.bold, self.italic) {
            (true, true) => PieceKind::BoldItalicText,
            (true, false) => PieceKind::BoldText,
            (false, true) => PieceKind::ItalicText,
            (false, false) => PieceKind::NormalText,
        }
    }

    /// Style for the children of `element`.
    fn with_element(self, element: &Element) -> Self {
        let mut next = self;

        match element.name() {
            "strong" | "b" => next.bold = true,
            "em" | "i" => next.italic = true,
            _ => {}
        }

        if let Some(style) = element.attr("style") {
            let style: String = style.to_ascii_lowercase().chars().filter(|c| !c.is_whitespace()).collect();
            if BOLD_DECLARATIONS.iter().any(|decl| style.contains(decl)) {
                next.bold = true;
            }
            if style.contains("font-style:italic") || style.contains("font-style:oblique") {
                next.italic = true;
            }
        }

        next
    }
}

/// Element nesting walked recursively; anything deeper is kept as plain text.
const MAX_DOM_DEPTH: usize = 128;

/// Quote and list nesting; deeper containers are flattened into their parent.
const MAX_CONTAINER_DEPTH: usize = 64;

/// Position of the walk: inherited styling plus how deep it has gone.
#[derive(Debug, Clone, Copy, Default)]
struct Scope {
    style: TextStyle,
    depth: usize,
    containers: usize,
}

impl Scope {
    fn with_element(self, element: &Element) -> Self {
        Self { style: self.style.with_element(element), ..self }
    }

    fn nested(self) -> Self {
        Self { containers: self.containers + 1, ..self }
    }

    fn at_container_limit(self) -> bool {
        self.containers >= MAX_CONTAINER_DEPTH
    }
}

struct PieceBuilder<'u> {
    base_url: Option<&'u Url>,
}

impl PieceBuilder<'_> {
    fn children(&self, element: ElementRef<'_>, scope: Scope, out: &mut Vec<Piece>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => push_text(out, scope.style, text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child, scope, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&self, element: ElementRef<'_>, scope: Scope, out: &mut Vec<Piece>) {
        let name = element.value().name();
        if IGNORED_TAGS.contains(&name) {
            return;
        }

        if scope.depth >= MAX_DOM_DEPTH {
            push_text(out, scope.style, &element.text().collect::<String>());
            return;
        }
        let scope = Scope { depth: scope.depth + 1, ..scope };

        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<u8>().unwrap_or(1);
                let text = element_text(element);
                if !text.is_empty() {
                    out.push(Piece::header(level, text));
                }
            }
            "br" => out.push(Piece::br()),
            "hr" => {}
            "img" => {
                if let Some(image) = self.image(element) {
                    out.push(image);
                }
            }
            "a" => self.anchor(element, scope, out),
            "blockquote" if scope.at_container_limit() => self.children(element, scope.with_element(element.value()), out),
            "blockquote" => {
                let pieces = self.collect(element, scope.nested());
                if !pieces.is_empty() {
                    out.push(Piece::block_quote(pieces));
                }
            }
            "ul" | "ol" => self.list(element, scope, name == "ol", out),
            "pre" => {
                let lines = code_lines(element);
                if !lines.is_empty() {
                    out.push(Piece::code_block(lines));
                }
            }
            "table" => {
                if let Some(markup) = table_markdown(element) {
                    out.push(Piece::native_table(markup));
                }
            }
            _ if BLOCK_TAGS.contains(&name) => self.block(element, scope, out),
            _ => self.children(element, scope.with_element(element.value()), out),
        }
    }

    /// Walks a block element and ends its line if the content did not.
    fn block(&self, element: ElementRef<'_>, scope: Scope, out: &mut Vec<Piece>) {
        let before = out.len();
        self.children(element, scope.with_element(element.value()), out);
        if out.len() > before && !out.last().is_some_and(ends_line) {
            out.push(Piece::br());
        }
    }

    /// Pieces of a nested container, without leading or trailing breaks.
    fn collect(&self, element: ElementRef<'_>, scope: Scope) -> Vec<Piece> {
        let mut pieces = Vec::new();
        self.children(element, scope.with_element(element.value()), &mut pieces);
        trim_breaks(&mut pieces);
        pieces
    }

    fn image(&self, element: ElementRef<'_>) -> Option<Piece> {
        let value = element.value();
        let src = [value.attr("data-src"), value.attr("src")]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|src| !src.is_empty())?;

        Some(Piece::image(self.resolve(src), value.attr("alt").unwrap_or_default().trim()))
    }

    fn anchor(&self, element: ElementRef<'_>, scope: Scope, out: &mut Vec<Piece>) {
        let href = element.value().attr("href").map(str::trim).unwrap_or_default();
        let text = element_text(element);

        if href.is_empty() || href.starts_with("javascript:") || text.is_empty() {
            self.children(element, scope, out);
        } else {
            out.push(Piece::link(text, self.resolve(href)));
        }
    }

    /// Each `li` becomes one list piece holding that item's content.
    ///
    /// Past the container limit items are walked as plain blocks instead.
    fn list(&self, element: ElementRef<'_>, scope: Scope, ordered: bool, out: &mut Vec<Piece>) {
        for child in element.children().filter_map(ElementRef::wrap) {
            if child.value().name() != "li" {
                self.element(child, scope, out);
                continue;
            }

            if scope.at_container_limit() {
                self.block(child, scope, out);
                continue;
            }

            let pieces = self.collect(child, scope.nested());
            if pieces.is_empty() {
                continue;
            }
            out.push(if ordered { Piece::ordered_list(pieces) } else { Piece::unordered_list(pieces) });
        }
    }

    fn resolve(&self, reference: &str) -> String {
        if let Some(base) = self.base_url
            && let Ok(url) = base.join(reference)
        {
            return url.to_string();
        }

        if reference.starts_with("//") { format!("https:{}", reference) } else { reference.to_string() }
    }
}

/// Appends a text node, merging it into the previous piece when styles match.
fn push_text(out: &mut Vec<Piece>, style: TextStyle, raw: &str) {
    let mut text = collapse_whitespace(raw);
    if text.trim().is_empty() {
        if !text.is_empty() && out.last().is_some_and(|piece| is_text(piece) && !ends_with_space(piece)) {
            append_text(out, PieceKind::NormalText, " ");
        }
        return;
    }

    if out.last().is_none_or(ends_line) {
        text = text.trim_start().to_string();
    }

    let kind = style.kind();
    if kind == PieceKind::NormalText {
        append_text(out, kind, &text);
        return;
    }

    // Emphasis markers must hug the text, so surrounding spaces stay plain.
    let core = text.trim();
    if text.starts_with(' ') {
        append_text(out, PieceKind::NormalText, " ");
    }
    append_text(out, kind, core);
    if text.ends_with(' ') {
        append_text(out, PieceKind::NormalText, " ");
    }
}

fn append_text(out: &mut Vec<Piece>, kind: PieceKind, text: &str) {
    if let Some(last) = out.last_mut()
        && last.kind == kind
        && let PieceValue::Text(existing) = &mut last.value
    {
        existing.push_str(text);
        return;
    }

    out.push(Piece::new(kind, PieceValue::Text(text.to_string())));
}

fn is_text(piece: &Piece) -> bool {
    matches!(
        piece.kind,
        PieceKind::NormalText | PieceKind::BoldText | PieceKind::ItalicText | PieceKind::BoldItalicText | PieceKind::Link
    )
}

fn ends_with_space(piece: &Piece) -> bool {
    matches!(&piece.value, PieceValue::Text(text) if text.ends_with(' '))
}

/// Whether the piece's Markdown already ends with a line break.
fn ends_line(piece: &Piece) -> bool {
    matches!(
        piece.kind,
        PieceKind::Br
            | PieceKind::Header
            | PieceKind::CodeBlock
            | PieceKind::Table
            | PieceKind::BlockQuotes
            | PieceKind::OList
            | PieceKind::UList
    )
}

fn trim_breaks(pieces: &mut Vec<Piece>) {
    while pieces.last().is_some_and(|piece| piece.kind == PieceKind::Br) {
        pieces.pop();
    }
    let leading = pieces.iter().take_while(|piece| piece.kind == PieceKind::Br).count();
    pieces.drain(..leading);
}

fn collapse_whitespace(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut last_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !last_space {
                output.push(' ');
            }
            last_space = true;
        } else {
            output.push(c);
            last_space = false;
        }
    }

    output
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>()).trim().to_string()
}

/// Text of a preformatted element with `<br>` turned into newlines.
fn preformatted_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();

    for node in element.descendants() {
        match node.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(el) if el.name() == "br" => text.push('\n'),
            _ => {}
        }
    }

    text.replace('\u{a0}', " ").replace("\r\n", "\n")
}

/// Code lines of a `pre`: one `code` child per line when there are several,
/// otherwise the text split on newlines.
fn code_lines(pre: ElementRef<'_>) -> Vec<String> {
    let codes: Vec<ElementRef<'_>> =
        pre.children().filter_map(ElementRef::wrap).filter(|el| el.value().name() == "code").collect();

    let blocks = if codes.len() > 1 {
        codes.into_iter().map(preformatted_text).collect()
    } else {
        vec![preformatted_text(pre)]
    };

    blocks
        .iter()
        .flat_map(|block| block.trim_end_matches('\n').split('\n').map(str::to_string).collect::<Vec<_>>())
        .collect()
}

/// Renders a table as a pipe table, the first row being the header.
fn table_markdown(table: ElementRef<'_>) -> Option<String> {
    let rows: Vec<Vec<String>> = table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr")
        .map(|tr| {
            tr.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(|cell| escape_pipe(&element_text(cell)))
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    let width = rows.iter().map(Vec::len).max()?;
    let mut markup = String::new();

    for (index, row) in rows.iter().enumerate() {
        markup.push('|');
        for column in 0..width {
            markup.push(' ');
            markup.push_str(row.get(column).map(String::as_str).unwrap_or_default());
            markup.push_str(" |");
        }
        markup.push('\n');

        if index == 0 {
            markup.push('|');
            markup.push_str(&" --- |".repeat(width));
            markup.push('\n');
        }
    }

    Some(markup)
}

/// Escape pipe characters for Markdown tables
fn escape_pipe(s: &str) -> String {
    s.replace('|', "\\|")
}
