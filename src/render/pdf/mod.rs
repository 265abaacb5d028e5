//! PDF output: pagination then serialization.

mod layout;
mod writer;

pub use layout::{paginate, Font, LayoutPage, PageElement, Segment, TextLine};
pub use writer::encode_win_ansi;

use crate::error::Result;
use crate::format::Format;
use crate::model::Document;

use super::{DocumentRenderer, RenderOptions};

/// Convert a document to PDF bytes.
pub fn to_pdf(doc: &Document, options: &RenderOptions) -> Result<Vec<u8>> {
    doc.validate()?;
    options.page.validate()?;
    let pages = paginate(doc, &options.page);

    let mut metadata = doc.metadata.clone();
    if metadata.title.is_none() {
        metadata.title = doc.title();
    }
    writer::write_pdf(&pages, &metadata, &options.page)
}

/// PDF output with real pagination.
#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    _private: (),
}

impl PdfRenderer {
    /// Create a new PDF renderer.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl DocumentRenderer for PdfRenderer {
    fn format(&self) -> Format {
        Format::Pdf
    }

    fn render(&self, doc: &Document, options: &RenderOptions) -> Result<Vec<u8>> {
        to_pdf(doc, options)
    }
}
