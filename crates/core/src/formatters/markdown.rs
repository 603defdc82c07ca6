use crate::images::{ImageFiles, image_file_name};
use crate::piece::{Article, Piece, PieceKind, PieceValue, ShapeMismatch};

/// Markdown produced from an article, plus the image files it references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedMarkdown {
    /// The Markdown document.
    pub markdown: String,
    /// Images to persist next to the document, keyed by file name.
    pub images: ImageFiles,
}

/// Render an article as Markdown.
///
/// The title is rendered as a heading, then the content is folded depth-first
/// in document order. Images carrying raw bytes are collected into
/// [`RenderedMarkdown::images`] under content-addressed names.
pub fn render_markdown(article: &Article) -> RenderedMarkdown {
    let mut markdown = soft(&article.title, render_header(&article.title));
    let (content, images) = render_pieces(&article.content, 0);
    markdown.push_str(&content);

    RenderedMarkdown { markdown, images }
}

/// Render a sequence of sibling pieces at the given nesting depth.
///
/// Base64 images are numbered from zero within this call and their reference
/// definitions are appended once all siblings are rendered.
fn render_pieces(pieces: &[Piece], depth: usize) -> (String, ImageFiles) {
    render_sequence(pieces, depth, None)
}

/// Like [`render_pieces`], but every line starts with the quote `prefix`.
///
/// Nested quotes carry their own longer prefix and are copied as they are.
fn render_sequence(pieces: &[Piece], depth: usize, quote: Option<&str>) -> (String, ImageFiles) {
    let mut output = String::new();
    let mut images = ImageFiles::new();
    let mut base64_images: Vec<&str> = Vec::new();

    for piece in pieces {
        let rendered = soft(piece, render_piece(piece, depth, &mut images, &mut base64_images));
        match quote {
            Some(prefix) if piece.kind != PieceKind::BlockQuotes => push_quoted(&mut output, &rendered, prefix),
            _ => output.push_str(&rendered),
        }
    }

    for (index, payload) in base64_images.iter().enumerate() {
        let footnote = format!("\n[{}]:data:image/png;base64,{}", index, payload);
        match quote {
            Some(prefix) => push_quoted(&mut output, &footnote, prefix),
            None => output.push_str(&footnote),
        }
    }

    (output, images)
}

fn render_piece<'a>(
    piece: &'a Piece, depth: usize, images: &mut ImageFiles, base64_images: &mut Vec<&'a str>,
) -> Result<String, ShapeMismatch> {
    match piece.kind {
        PieceKind::Header => render_header(piece),
        PieceKind::Link => Ok(format!("[{}]({})", piece.as_text()?, piece.attr("href"))),
        PieceKind::NormalText => Ok(piece.as_text()?.to_string()),
        PieceKind::BoldText => Ok(format!("**{}**", piece.as_text()?)),
        PieceKind::ItalicText => Ok(format!("*{}*", piece.as_text()?)),
        PieceKind::BoldItalicText => Ok(format!("***{}***", piece.as_text()?)),
        PieceKind::Image => render_image(piece, images),
        PieceKind::ImageBase64 => {
            let payload = piece.as_text()?;
            let reference = format!("![{}][{}]", piece.attr("alt"), base64_images.len());
            base64_images.push(payload);
            Ok(reference)
        }
        PieceKind::Table => render_table(piece),
        PieceKind::CodeBlock => Ok(format!("```\n{}\n```\n", piece.as_lines()?.join("\n"))),
        PieceKind::BlockQuotes => {
            let (body, nested) = render_sequence(piece.as_pieces()?, depth + 1, Some(quote_prefix(depth).as_str()));
            images.extend(nested);
            Ok(format!("{}  \n", body))
        }
        PieceKind::OList | PieceKind::UList => {
            let (body, nested) = render_pieces(piece.as_pieces()?, depth + 1);
            images.extend(nested);
            Ok(format!("{}{}  \n", list_prefix(piece.kind, depth), body))
        }
        PieceKind::Br => Ok("  \n".to_string()),
        PieceKind::Null => Ok(String::new()),
    }
}

/// Heading line: `level` hashes, the text, and a hard line break.
fn render_header(piece: &Piece) -> Result<String, ShapeMismatch> {
    let text = piece.as_text()?;
    Ok(format!("{} {}  \n", "#".repeat(header_level(piece)), text))
}

/// Heading depth from the `level` attribute, clamped to 1..=6.
fn header_level(piece: &Piece) -> usize {
    piece.attr("level").trim().parse::<usize>().unwrap_or(1).clamp(1, 6)
}

fn render_image(piece: &Piece, images: &mut ImageFiles) -> Result<String, ShapeMismatch> {
    if matches!(piece.value, PieceValue::None) {
        return Ok(format!("![{}]({})", piece.attr("alt"), piece.attr("src")));
    }

    let bytes = piece.as_bytes()?;
    let file_name = image_file_name(piece.attr("src"), bytes);
    let alt = match piece.attr("alt") {
        "" => file_name.as_str(),
        alt => alt,
    };
    let reference = format!("![{}](./{})", alt, file_name);
    images.insert(file_name, bytes.to_vec());
    Ok(reference)
}

/// Only native table markup is supported; anything else renders empty.
fn render_table(piece: &Piece) -> Result<String, ShapeMismatch> {
    if piece.attr("type") == "native" { Ok(piece.as_text()?.to_string()) } else { Ok(String::new()) }
}

/// `depth + 1` quote markers followed by a space.
fn quote_prefix(depth: usize) -> String {
    format!("{} ", ">".repeat(depth + 1))
}

/// Four spaces per depth level followed by the list marker.
///
/// Ordered items always use `1. `; Markdown renderers number them.
fn list_prefix(kind: PieceKind, depth: usize) -> String {
    let marker = if kind == PieceKind::OList { "1. " } else { "- " };
    format!("{}{}", "    ".repeat(depth), marker)
}

/// Append `text`, starting each new line with `prefix`.
///
/// Empty lines get the bare marker so they stay inside the quote.
fn push_quoted(output: &mut String, text: &str, prefix: &str) {
    for line in text.split_inclusive('\n') {
        if output.is_empty() || output.ends_with('\n') {
            output.push_str(if line == "\n" { prefix.trim_end() } else { prefix });
        }
        output.push_str(line);
    }
}

fn soft(piece: &Piece, rendered: Result<String, ShapeMismatch>) -> String {
    rendered.unwrap_or_else(|err| {
        tracing::debug!(kind = ?piece.kind, "rendering empty piece: {}", err);
        String::new()
    })
}

/// Markdown formatter for parsed articles.
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, article: &Article) -> RenderedMarkdown {
        render_markdown(article)
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}
