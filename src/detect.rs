//! Source format detection.

use crate::error::{Error, Result};
use crate::format::Format;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Number of bytes inspected when sniffing a file.
const SNIFF_LEN: usize = 1024;

/// Tags that mark the start of an HTML payload.
const HTML_PREFIXES: &[&str] = &[
    "<!doctype html",
    "<html",
    "<head",
    "<body",
    "<div",
    "<p>",
    "<p ",
    "<h1",
    "<h2",
    "<h3",
    "<h4",
    "<h5",
    "<h6",
    "<ul",
    "<ol",
    "<pre",
    "<section",
    "<article",
    "<!--",
];

/// Detect the format of a file.
///
/// The extension wins when it names a known format; otherwise the first
/// bytes of the file are sniffed.
///
/// # Example
/// ```no_run
/// use docshift::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("notes.md").unwrap();
/// println!("{}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<Format> {
    let path = path.as_ref();
    if let Some(format) = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(Format::from_extension)
    {
        return Ok(format);
    }

    let file = File::open(path)?;
    let mut header = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect the format of a payload from its leading bytes.
///
/// # Returns
/// * `Format::Pdf` if the data starts with the PDF header
/// * `Format::Html` if the first tag looks like HTML markup
/// * `Format::Markdown` for any other UTF-8 text
/// * `Err(Error::InvalidInput)` for empty or binary non-PDF data
pub fn detect_format_from_bytes(data: &[u8]) -> Result<Format> {
    if data.is_empty() {
        return Err(Error::InvalidInput("cannot detect format of empty input".into()));
    }

    if is_pdf_bytes(data) {
        return Ok(Format::Pdf);
    }

    let head = &data[..data.len().min(SNIFF_LEN)];
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        // The window may end inside a multi-byte character.
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return Err(Error::InvalidInput("input is not UTF-8 text".into())),
    };

    if looks_like_html(text) {
        Ok(Format::Html)
    } else {
        Ok(Format::Markdown)
    }
}

/// Check if bytes start with the PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}

fn looks_like_html(text: &str) -> bool {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    let lower = trimmed
        .chars()
        .take(32)
        .collect::<String>()
        .to_ascii_lowercase();
    HTML_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_pdf() {
        let data = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3";
        assert_eq!(detect_format_from_bytes(data).unwrap(), Format::Pdf);
    }

    #[test]
    fn test_detect_html() {
        assert_eq!(
            detect_format_from_bytes(b"<!DOCTYPE html><html></html>").unwrap(),
            Format::Html
        );
        assert_eq!(
            detect_format_from_bytes(b"\n  <h2>Sub</h2><ul><li>a</li></ul>").unwrap(),
            Format::Html
        );
    }

    #[test]
    fn test_detect_markdown() {
        assert_eq!(
            detect_format_from_bytes(b"# Title\n\nSome *text*.").unwrap(),
            Format::Markdown
        );
        // Inline HTML later in the text does not make it HTML
        assert_eq!(
            detect_format_from_bytes(b"Intro <b>bold</b>").unwrap(),
            Format::Markdown
        );
    }

    #[test]
    fn test_detect_rejects_binary_and_empty() {
        assert!(matches!(
            detect_format_from_bytes(&[]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            detect_format_from_bytes(&[0xFF, 0xFE, 0x00, 0x01]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_detect_from_path_extension() {
        // Extension lookup never touches the file system
        assert_eq!(
            detect_format_from_path("missing/notes.markdown").unwrap(),
            Format::Markdown
        );
        assert_eq!(detect_format_from_path("page.HTM").unwrap(), Format::Html);
    }

    #[test]
    fn test_is_pdf_bytes() {
        assert!(is_pdf_bytes(b"%PDF-1.4\n"));
        assert!(!is_pdf_bytes(b"Not a PDF"));
        assert!(!is_pdf_bytes(b""));
    }
}
