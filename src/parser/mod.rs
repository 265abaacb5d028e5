//! Source readers: Markdown and HTML into the document model.

mod html;
mod markdown;
mod options;
mod text;

pub use html::{parse_html, HtmlParser};
pub use markdown::{parse_markdown, MarkdownParser};
pub use options::{ErrorMode, ParseOptions, DEFAULT_MAX_DEPTH};

use crate::error::Result;
use crate::format::Format;
use crate::model::Document;

/// A reader turning raw bytes of one source format into a [`Document`].
pub trait DocumentParser: Send + Sync {
    /// The format this parser reads.
    fn format(&self) -> Format;

    /// Parse a payload. Non-UTF-8 input is a parse error.
    fn parse(&self, bytes: &[u8], options: &ParseOptions) -> Result<Document>;
}
