use crate::piece::{Article, Piece, PieceKind, ShapeMismatch};

/// Extract the plain text of an article.
///
/// The title comes first, followed by a blank line and the body text. Styling,
/// link targets, images and tables are dropped.
pub fn extract_text(article: &Article) -> String {
    let mut output = String::new();
    output.push_str(article.title.as_text().unwrap_or_default());
    output.push_str("\n\n");
    output.push_str(&extract_pieces(&article.content));
    output
}

fn extract_pieces(pieces: &[Piece]) -> String {
    let mut text = String::new();

    for piece in pieces {
        if let Err(err) = extract_piece(piece, &mut text) {
            tracing::debug!(kind = ?piece.kind, "skipping text of piece: {}", err);
        }
    }

    text
}

fn extract_piece(piece: &Piece, text: &mut String) -> Result<(), ShapeMismatch> {
    match piece.kind {
        PieceKind::Header => {
            text.push_str(piece.as_text()?);
            text.push_str("\n\n");
        }
        PieceKind::NormalText
        | PieceKind::BoldText
        | PieceKind::ItalicText
        | PieceKind::BoldItalicText
        | PieceKind::Link => text.push_str(piece.as_text()?),
        PieceKind::BlockQuotes | PieceKind::OList | PieceKind::UList => {
            text.push_str(&extract_pieces(piece.as_pieces()?));
            text.push('\n');
        }
        PieceKind::CodeBlock => {
            for line in piece.as_lines()? {
                text.push_str(line);
                text.push('\n');
            }
            text.push('\n');
        }
        PieceKind::Br => text.push('\n'),
        PieceKind::Image | PieceKind::ImageBase64 | PieceKind::Table | PieceKind::Null => {}
    }

    Ok(())
}

/// Plain text formatter for parsed articles.
pub struct TextFormatter;

impl TextFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Extract the plain text of an article.
    pub fn convert(&self, article: &Article) -> String {
        extract_text(article)
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}
