//! Supported formats and the conversion paths between them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A document format the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// CommonMark text
    Markdown,
    /// HTML markup (fragment or full document)
    Html,
    /// Paginated PDF; only ever a target
    Pdf,
}

impl Format {
    /// All formats, in a stable order.
    pub const ALL: [Format; 3] = [Format::Markdown, Format::Html, Format::Pdf];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Markdown => "markdown",
            Format::Html => "html",
            Format::Pdf => "pdf",
        }
    }

    /// Content type for a response body in this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Markdown => "text/markdown",
            Format::Html => "text/html",
            Format::Pdf => "application/pdf",
        }
    }

    /// Preferred file extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Markdown => "md",
            Format::Html => "html",
            Format::Pdf => "pdf",
        }
    }

    /// Whether the output of this format is text.
    pub fn is_text(&self) -> bool {
        !matches!(self, Format::Pdf)
    }

    /// Whether a parser exists for this format.
    pub fn is_readable(&self) -> bool {
        !matches!(self, Format::Pdf)
    }

    /// Look up a format by MIME type. Parameters such as `charset` are ignored.
    pub fn from_mime(mime: &str) -> Option<Format> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "text/markdown" | "text/x-markdown" => Some(Format::Markdown),
            "text/html" | "application/xhtml+xml" => Some(Format::Html),
            "application/pdf" => Some(Format::Pdf),
            _ => None,
        }
    }

    /// Look up a format by file extension (with or without the dot).
    pub fn from_extension(ext: &str) -> Option<Format> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "md" | "markdown" | "mdown" | "mkd" => Some(Format::Markdown),
            "html" | "htm" | "xhtml" => Some(Format::Html),
            "pdf" => Some(Format::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Format::Markdown),
            "html" | "htm" => Ok(Format::Html),
            "pdf" => Ok(Format::Pdf),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

/// Every format the engine accepts.
pub fn supported_formats() -> [Format; 3] {
    Format::ALL
}

/// Check whether `source` can be converted to `target`.
///
/// Identity paths are always valid. PDF is a sink: it can be produced
/// from any readable format but never read back.
pub const fn is_valid_path(source: Format, target: Format) -> bool {
    match (source, target) {
        (Format::Pdf, Format::Pdf) => true,
        (Format::Pdf, _) => false,
        _ => true,
    }
}

/// All valid (source, target) pairs.
pub fn supported_paths() -> Vec<(Format, Format)> {
    Format::ALL
        .iter()
        .flat_map(|&source| Format::ALL.iter().map(move |&target| (source, target)))
        .filter(|&(source, target)| is_valid_path(source, target))
        .collect()
}
