pub mod batch;
pub mod convert;
pub mod error;
pub mod fetch;
pub mod formatters;
pub mod images;
#[cfg(feature = "fetch")]
pub mod loader;
pub mod normalize;
pub mod parse;
pub mod piece;

#[cfg(feature = "fetch")]
pub use batch::batch_convert;
pub use batch::{batch_convert_to_text, find_html_files, list_subdirectories, select_html_file};
pub use convert::{ConvertConfig, ConvertConfigBuilder, MARKDOWN_EXTENSION, TEXT_EXTENSION};
#[cfg(feature = "fetch")]
pub use convert::{convert_file_to_markdown, convert_url_to_markdown, parse_from_file, parse_from_url};
pub use convert::{convert_file_to_text, output_file_name, read_article, resolve_output_path, save_markdown, save_text};
pub use error::{Mp2mdError, Result};
pub use fetch::{FetchConfig, fetch_file};
#[cfg(feature = "fetch")]
pub use fetch::fetch_url;
pub use formatters::{MarkdownFormatter, RenderedMarkdown, TextFormatter, extract_text, render_markdown};
pub use images::{ImageFiles, ImagePolicy, content_hash, image_extension, image_file_name};
#[cfg(feature = "fetch")]
pub use loader::{ImageLoader, apply_image_policy};
pub use normalize::{normalized_dir_name, rename_directories};
pub use parse::{Document, parse_article};
pub use piece::{Article, Piece, PieceKind, PieceValue, ShapeMismatch};
