//! # docshift
//!
//! Document conversion between Markdown, HTML and PDF.
//!
//! Every source is parsed into one document model and every target is
//! rendered from it, so adding a format means one parser or one renderer.
//! PDF is output-only.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docshift::{convert, Format};
//!
//! fn main() -> docshift::Result<()> {
//!     let html = convert(b"# Title\n\nSome *text*.", Format::Markdown, Format::Html)?;
//!     println!("{}", String::from_utf8_lossy(&html));
//!
//!     let pdf = convert(b"<h1>Report</h1><p>Body</p>", Format::Html, Format::Pdf)?;
//!     std::fs::write("report.pdf", pdf)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Markdown and HTML readers**: pulldown-cmark and html5ever based
//! - **Markdown, HTML and PDF writers**: the PDF writer paginates
//! - **Job lifecycle**: observable jobs with progress and error reporting
//! - **Parallel batches**: uses Rayon for independent conversions
//! - **Async**: `convert_async` behind the `async` feature

pub mod convert;
pub mod detect;
pub mod error;
pub mod format;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use convert::{
    ConversionJob, ConversionRequest, ConvertOptions, ConvertResult, Engine, JobObserver,
    JobSnapshot, JobStatus, JobStore, MemoryJobStore,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path};
pub use error::{ConversionError, Error, ErrorKind, Result};
pub use format::{is_valid_path, supported_formats, supported_paths, Format};
pub use model::{
    Block, CodeBlock, Document, DocumentStats, Heading, InlineContent, List, ListItem, Metadata,
    Paragraph, TextRun, TextStyle,
};
pub use parser::{DocumentParser, ErrorMode, ParseOptions};
pub use render::{DocumentRenderer, PageLayout, PageSize, RenderOptions};

use std::path::Path;

/// Convert a payload with default options.
///
/// # Example
///
/// ```no_run
/// use docshift::{convert, Format};
///
/// let markdown = convert(b"<h2>Sub</h2><ul><li>a</li></ul>", Format::Html, Format::Markdown).unwrap();
/// assert!(String::from_utf8(markdown).unwrap().starts_with("## Sub"));
/// ```
pub fn convert(content: &[u8], source: Format, target: Format) -> Result<Vec<u8>> {
    Engine::new()
        .convert(content, source, target)
        .map(|result| result.output)
}

/// Convert a file, detecting the source format from its extension or content.
///
/// # Example
///
/// ```no_run
/// use docshift::{convert_file, Format};
///
/// let html = convert_file("README.md", Format::Html).unwrap();
/// ```
pub fn convert_file<P: AsRef<Path>>(path: P, target: Format) -> Result<Vec<u8>> {
    let source = detect_format_from_path(path.as_ref())?;
    Engine::new()
        .convert_file(path, source, target)
        .map(|result| result.output)
}

/// Parse a payload into the document model.
///
/// # Example
///
/// ```no_run
/// use docshift::{parse, Format};
///
/// let doc = parse(b"# Title", Format::Markdown).unwrap();
/// println!("{:?}", doc.title());
/// ```
pub fn parse(content: &[u8], format: Format) -> Result<Document> {
    let options = ParseOptions::default();
    match format {
        Format::Markdown => parser::MarkdownParser::new().parse(content, &options),
        Format::Html => parser::HtmlParser::new().parse(content, &options),
        Format::Pdf => Err(Error::UnsupportedPath {
            from: Format::Pdf,
            to: Format::Markdown,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_markdown_to_html() {
        let html = convert(b"# Title\n\nSome *text*.", Format::Markdown, Format::Html).unwrap();
        let html = String::from_utf8(html).unwrap();
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>text</em>"));
    }

    #[test]
    fn test_convert_html_to_markdown() {
        let md = convert(
            b"<h2>Sub</h2><ul><li>a</li><li>b</li></ul>",
            Format::Html,
            Format::Markdown,
        )
        .unwrap();
        assert_eq!(String::from_utf8(md).unwrap(), "## Sub\n\n- a\n- b\n");
    }

    #[test]
    fn test_convert_pdf_source_rejected() {
        let err = convert(b"%PDF-1.7", Format::Pdf, Format::Html).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedPath);
    }

    #[test]
    fn test_parse_pdf_rejected() {
        assert!(matches!(
            parse(b"%PDF-1.7", Format::Pdf),
            Err(Error::UnsupportedPath { .. })
        ));
    }
}
