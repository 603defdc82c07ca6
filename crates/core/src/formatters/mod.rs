pub mod markdown;
pub mod text;

pub use markdown::{MarkdownFormatter, RenderedMarkdown, render_markdown};
pub use text::{TextFormatter, extract_text};
