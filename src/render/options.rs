//! Rendering options and configuration.

use std::str::FromStr;

use crate::error::{Error, Result};

/// Options for rendering a document to any output format.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Character to use for unordered list markers (`-`, `*` or `+`)
    pub list_marker: char,

    /// Escape special Markdown characters in text
    pub escape_special_chars: bool,

    /// Include YAML frontmatter with metadata (Markdown output)
    pub include_frontmatter: bool,

    /// Wrap HTML output in a complete `<html>` document
    pub html_standalone: bool,

    /// Page geometry and typography for PDF output
    pub page: PageLayout,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the list marker character. Anything but `-`, `*` or `+` falls back to `-`.
    pub fn with_list_marker(mut self, marker: char) -> Self {
        self.list_marker = match marker {
            '-' | '*' | '+' => marker,
            _ => '-',
        };
        self
    }

    /// Enable or disable Markdown escaping.
    pub fn with_escaping(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }

    /// Enable or disable frontmatter.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }

    /// Emit a complete HTML document instead of a fragment.
    pub fn with_standalone_html(mut self, standalone: bool) -> Self {
        self.html_standalone = standalone;
        self
    }

    /// Set the PDF page layout.
    pub fn with_page_layout(mut self, page: PageLayout) -> Self {
        self.page = page;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            list_marker: '-',
            escape_special_chars: true,
            include_frontmatter: false,
            html_standalone: false,
            page: PageLayout::default(),
        }
    }
}

/// Standard page sizes, in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageSize {
    /// US Letter, 612 x 792
    #[default]
    Letter,
    /// ISO A4, 595 x 842
    A4,
    /// US Legal, 612 x 1008
    Legal,
    /// Arbitrary size
    Custom {
        /// Width in points
        width: f32,
        /// Height in points
        height: f32,
    },
}

impl PageSize {
    /// Page dimensions as (width, height) in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.0, 842.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

impl FromStr for PageSize {
    type Err = Error;

    /// Parse `letter`, `a4`, `legal` or `<width>x<height>` in points.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "letter" => Ok(PageSize::Letter),
            "a4" => Ok(PageSize::A4),
            "legal" => Ok(PageSize::Legal),
            _ => {
                let parsed = s.split_once('x').and_then(|(w, h)| {
                    Some((w.trim().parse::<f32>().ok()?, h.trim().parse::<f32>().ok()?))
                });
                match parsed {
                    Some((width, height)) if width > 0.0 && height > 0.0 => {
                        Ok(PageSize::Custom { width, height })
                    }
                    _ => Err(Error::InvalidInput(format!(
                        "unknown page size '{}' (expected letter, a4, legal or WxH)",
                        s
                    ))),
                }
            }
        }
    }
}

/// Page geometry and typography for PDF output.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// Page size
    pub size: PageSize,

    /// Margin on every side, in points
    pub margin: f32,

    /// Body text size
    pub body_font_size: f32,

    /// Code block text size
    pub code_font_size: f32,

    /// Heading sizes for levels 1-6
    pub heading_font_sizes: [f32; 6],

    /// Line height as a multiple of the font size
    pub line_spacing: f32,

    /// Extra space after each block, as a multiple of the body font size
    pub paragraph_spacing: f32,

    /// Compress content streams with Flate
    pub compress: bool,
}

impl PageLayout {
    /// Create a layout with defaults (Letter, 1 inch margins).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size.
    pub fn with_size(mut self, size: PageSize) -> Self {
        self.size = size;
        self
    }

    /// Set the margin.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin.max(0.0);
        self
    }

    /// Set the body font size.
    pub fn with_body_font_size(mut self, size: f32) -> Self {
        self.body_font_size = size;
        self
    }

    /// Set the line spacing multiplier.
    pub fn with_line_spacing(mut self, spacing: f32) -> Self {
        self.line_spacing = spacing.max(1.0);
        self
    }

    /// Enable or disable stream compression.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Width available for text.
    pub fn usable_width(&self) -> f32 {
        self.size.dimensions().0 - 2.0 * self.margin
    }

    /// Height available for text on one page.
    pub fn usable_height(&self) -> f32 {
        self.size.dimensions().1 - 2.0 * self.margin
    }

    /// Font size for a heading level (clamped to 1-6).
    pub fn heading_size(&self, level: u8) -> f32 {
        self.heading_font_sizes[(level.clamp(1, 6) - 1) as usize]
    }

    /// Reject geometry that leaves no room for a single line.
    pub fn validate(&self) -> Result<()> {
        let largest = self
            .heading_font_sizes
            .iter()
            .copied()
            .chain([self.body_font_size, self.code_font_size])
            .fold(0.0f32, f32::max);
        if self.body_font_size <= 0.0 || self.code_font_size <= 0.0 {
            return Err(Error::Render("font sizes must be positive".into()));
        }
        if self.usable_width() < largest * 2.0 || self.usable_height() < largest * self.line_spacing {
            return Err(Error::Render(format!(
                "page {:?} with margin {} leaves no room for text",
                self.size, self.margin
            )));
        }
        Ok(())
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            size: PageSize::Letter,
            margin: 72.0,
            body_font_size: 11.0,
            code_font_size: 10.0,
            heading_font_sizes: [24.0, 20.0, 16.0, 14.0, 12.0, 11.0],
            line_spacing: 1.2,
            paragraph_spacing: 0.8,
            compress: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_builder() {
        let options = RenderOptions::new()
            .with_frontmatter(true)
            .with_list_marker('*')
            .with_standalone_html(true);

        assert!(options.include_frontmatter);
        assert_eq!(options.list_marker, '*');
        assert!(options.html_standalone);

        assert_eq!(RenderOptions::new().with_list_marker('x').list_marker, '-');
    }

    #[test]
    fn test_page_size_parse() {
        assert_eq!("A4".parse::<PageSize>().unwrap(), PageSize::A4);
        assert_eq!("letter".parse::<PageSize>().unwrap(), PageSize::Letter);
        assert_eq!(
            "300x400".parse::<PageSize>().unwrap(),
            PageSize::Custom {
                width: 300.0,
                height: 400.0
            }
        );
        assert!("tabloid".parse::<PageSize>().is_err());
        assert!("0x400".parse::<PageSize>().is_err());
    }

    #[test]
    fn test_usable_area() {
        let layout = PageLayout::default();
        assert_eq!(layout.usable_width(), 468.0);
        assert_eq!(layout.usable_height(), 648.0);
        assert_eq!(layout.heading_size(1), 24.0);
        assert_eq!(layout.heading_size(9), 11.0);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_tiny_page() {
        let layout = PageLayout::default()
            .with_size(PageSize::Custom {
                width: 100.0,
                height: 100.0,
            })
            .with_margin(45.0);
        assert!(matches!(layout.validate(), Err(Error::Render(_))));
    }
}
