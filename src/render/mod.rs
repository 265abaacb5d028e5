//! Renderers: the document model into Markdown, HTML and PDF.

mod html;
mod markdown;
mod options;
pub mod pdf;

pub use html::{escape_html, to_html, HtmlRenderer};
pub use markdown::{to_markdown, MarkdownRenderer};
pub use options::{PageLayout, PageSize, RenderOptions};
pub use pdf::{to_pdf, PdfRenderer};

use crate::error::Result;
use crate::format::Format;
use crate::model::Document;

/// A writer turning a [`Document`] into bytes of one target format.
///
/// Implementations validate the document structure first and fail with
/// [`Error::Render`](crate::Error::Render) on a malformed tree.
pub trait DocumentRenderer: Send + Sync {
    /// The format this renderer writes.
    fn format(&self) -> Format;

    /// Render a document.
    fn render(&self, doc: &Document, options: &RenderOptions) -> Result<Vec<u8>>;
}
