//! Pagination: document blocks to positioned text lines on fixed-size pages.
//!
//! Coordinates are PDF user space (points, origin at the bottom-left corner).
//! Lines are the atomic unit: a block may continue on the next page, a line
//! never does.

use crate::model::{Block, CodeBlock, Document, InlineContent, List, TextStyle};
use crate::render::PageLayout;

/// Horizontal offset of list item content and block quote content.
const NEST_INDENT: f32 = 18.0;

/// Tolerance for float accumulation when checking page overflow.
const EPSILON: f32 = 0.01;

/// Share of the usable width that nesting may consume.
const MAX_INDENT_SHARE: f32 = 0.5;

/// The standard Type1 faces used for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    /// Helvetica
    Regular,
    /// Helvetica-Bold
    Bold,
    /// Helvetica-Oblique
    Italic,
    /// Helvetica-BoldOblique
    BoldItalic,
    /// Courier
    Mono,
}

impl Font {
    /// Every face, in resource order.
    pub const ALL: [Font; 5] = [
        Font::Regular,
        Font::Bold,
        Font::Italic,
        Font::BoldItalic,
        Font::Mono,
    ];

    /// Resource name used in content streams.
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Italic => "F3",
            Font::BoldItalic => "F4",
            Font::Mono => "F5",
        }
    }

    /// PostScript name of the standard font.
    pub fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Italic => "Helvetica-Oblique",
            Font::BoldItalic => "Helvetica-BoldOblique",
            Font::Mono => "Courier",
        }
    }

    /// Face for a text style on top of a block's base face.
    fn for_style(base: Font, style: &TextStyle) -> Font {
        if style.code || base == Font::Mono {
            return Font::Mono;
        }
        let bold = style.bold || matches!(base, Font::Bold | Font::BoldItalic);
        let italic = style.italic || matches!(base, Font::Italic | Font::BoldItalic);
        match (bold, italic) {
            (true, true) => Font::BoldItalic,
            (true, false) => Font::Bold,
            (false, true) => Font::Italic,
            (false, false) => Font::Regular,
        }
    }

    /// Approximate advance width of a character, in points.
    pub fn char_width(self, c: char, size: f32) -> f32 {
        let em = match self {
            Font::Mono => 0.6,
            _ => {
                let width = match c {
                    ' ' => 0.278,
                    'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '!' | '|' | '\'' => 0.25,
                    'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' | '/' => 0.333,
                    'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.833,
                    'A'..='Z' => 0.667,
                    _ => 0.556,
                };
                if matches!(self, Font::Bold | Font::BoldItalic) {
                    width * 1.06
                } else {
                    width
                }
            }
        };
        em * size
    }

    /// Approximate width of a string, in points.
    pub fn text_width(self, text: &str, size: f32) -> f32 {
        text.chars().map(|c| self.char_width(c, size)).sum()
    }
}

/// A run of text in one face, positioned on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Face
    pub font: Font,
    /// Font size in points
    pub size: f32,
    /// Left edge
    pub x: f32,
    /// Text to draw
    pub text: String,
}

/// A positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Baseline position
    pub baseline: f32,
    /// Line box height (font size times line spacing)
    pub height: f32,
    /// Text runs, left to right
    pub segments: Vec<Segment>,
}

impl TextLine {
    /// Text of the line without positioning.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Something drawn on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageElement {
    /// A line of text
    Text(TextLine),
    /// A horizontal rule
    Rule {
        /// Start of the rule
        x1: f32,
        /// End of the rule
        x2: f32,
        /// Vertical position
        y: f32,
    },
}

/// One laid out page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutPage {
    /// Elements in drawing order
    pub elements: Vec<PageElement>,
}

impl LayoutPage {
    /// Text lines on this page.
    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.elements.iter().filter_map(|e| match e {
            PageElement::Text(line) => Some(line),
            PageElement::Rule { .. } => None,
        })
    }

    /// Check if nothing was placed on this page.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Lay out a document onto pages. Always yields at least one page.
pub fn paginate(doc: &Document, layout: &PageLayout) -> Vec<LayoutPage> {
    let mut paginator = Paginator::new(layout);
    paginator.blocks(&doc.blocks, 0.0);
    paginator.finish()
}

#[derive(Debug, Clone)]
struct Piece {
    font: Font,
    text: String,
}

/// An unpositioned line: what wrapping produces and pagination consumes.
#[derive(Debug, Clone)]
struct LineBox {
    indent: f32,
    size: f32,
    pieces: Vec<Piece>,
}

enum Token {
    Word { pieces: Vec<Piece>, space_before: bool },
    Break,
}

struct Paginator<'a> {
    layout: &'a PageLayout,
    page_height: f32,
    pages: Vec<LayoutPage>,
    current: LayoutPage,
    /// Height used on the current page, from the top margin down.
    cursor: f32,
    /// Space requested before the next line; dropped at a page top.
    pending_gap: f32,
    /// List marker to draw on the next placed line, with its indent.
    pending_marker: Option<(f32, Piece)>,
}

impl<'a> Paginator<'a> {
    fn new(layout: &'a PageLayout) -> Self {
        Self {
            layout,
            page_height: layout.size.dimensions().1,
            pages: Vec::new(),
            current: LayoutPage::default(),
            cursor: 0.0,
            pending_gap: 0.0,
            pending_marker: None,
        }
    }

    fn finish(mut self) -> Vec<LayoutPage> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        log::debug!("laid out {} pages", self.pages.len());
        self.pages
    }

    fn blocks(&mut self, blocks: &[Block], indent: f32) {
        for block in blocks {
            self.block(block, indent);
        }
    }

    /// Cap an indent so nested text keeps room on the line.
    fn clamp_indent(&self, indent: f32) -> f32 {
        indent.min(self.layout.usable_width() * MAX_INDENT_SHARE)
    }

    /// Marker indent for list content one level below `indent`.
    fn marker_indent(&self, indent: f32) -> f32 {
        (self.clamp_indent(indent + NEST_INDENT) - NEST_INDENT).max(0.0)
    }

    fn block(&mut self, block: &Block, indent: f32) {
        let indent = self.clamp_indent(indent);
        let body = self.layout.body_font_size;
        let block_gap = body * self.layout.paragraph_spacing;
        match block {
            Block::Paragraph(p) => {
                if p.is_empty() {
                    return;
                }
                self.inline(&p.content, Font::Regular, body, indent);
                self.gap(block_gap);
            }
            Block::Heading(h) => {
                let size = self.layout.heading_size(h.level);
                self.gap(size * 0.5);
                self.inline(&h.content, Font::Bold, size, indent);
                self.gap(block_gap);
            }
            Block::List(list) => {
                self.list(list, indent);
                self.gap(block_gap);
            }
            Block::ListItem(item) => {
                let marker = self.marker_indent(indent);
                self.pending_marker = Some((marker, bullet()));
                self.blocks(&item.blocks, marker + NEST_INDENT);
            }
            Block::CodeBlock(code) => {
                self.code(code, indent);
                self.gap(block_gap);
            }
            Block::BlockQuote { blocks } => {
                self.blocks(blocks, indent + NEST_INDENT);
                self.gap(block_gap);
            }
            Block::HorizontalRule => {
                self.rule(indent);
                self.gap(block_gap);
            }
        }
    }

    fn list(&mut self, list: &List, indent: f32) {
        let indent = self.marker_indent(indent);
        let item_gap = self.layout.body_font_size * 0.2;
        for (i, item) in list.items.iter().enumerate() {
            let marker = if list.ordered {
                Piece {
                    font: Font::Regular,
                    text: format!("{}.", list.start as usize + i),
                }
            } else {
                bullet()
            };
            self.pending_marker = Some((indent, marker));
            if item.blocks.is_empty() {
                // Keep the marker of an empty item visible
                self.place(LineBox {
                    indent: indent + NEST_INDENT,
                    size: self.layout.body_font_size,
                    pieces: Vec::new(),
                });
            }
            for block in &item.blocks {
                match block {
                    // Paragraphs inside items stay tight
                    Block::Paragraph(p) if !p.is_empty() => self.inline(
                        &p.content,
                        Font::Regular,
                        self.layout.body_font_size,
                        indent + NEST_INDENT,
                    ),
                    Block::List(nested) => self.list(nested, indent + NEST_INDENT),
                    other => self.block(other, indent + NEST_INDENT),
                }
            }
            self.gap(item_gap);
        }
    }

    fn inline(&mut self, content: &[InlineContent], base: Font, size: f32, indent: f32) {
        let indent = self.clamp_indent(indent);
        let width = self.layout.usable_width() - indent;
        for line in wrap(&tokenize(content, base), base, size, width) {
            self.place(LineBox {
                indent,
                size,
                pieces: line,
            });
        }
    }

    fn code(&mut self, code: &CodeBlock, indent: f32) {
        let indent = self.clamp_indent(indent);
        let size = self.layout.code_font_size;
        let width = self.layout.usable_width() - indent;
        for source_line in code.lines() {
            let text = source_line.replace('\t', "    ");
            for chunk in break_chars(&text, Font::Mono, size, width) {
                self.place(LineBox {
                    indent,
                    size,
                    pieces: vec![Piece {
                        font: Font::Mono,
                        text: chunk,
                    }],
                });
            }
        }
    }

    fn rule(&mut self, indent: f32) {
        let indent = self.clamp_indent(indent);
        let height = self.layout.body_font_size;
        let gap = self.reserve(height);
        let top = self.page_height - self.layout.margin - self.cursor - gap;
        self.cursor += gap + height;
        let x1 = self.layout.margin + indent;
        let x2 = self.layout.size.dimensions().0 - self.layout.margin;
        self.current.elements.push(PageElement::Rule {
            x1,
            x2,
            y: top - height / 2.0,
        });
    }

    fn gap(&mut self, amount: f32) {
        self.pending_gap = self.pending_gap.max(amount);
    }

    /// Make room for a line of `height`, breaking the page if needed.
    /// Returns the gap to apply before the line.
    fn reserve(&mut self, height: f32) -> f32 {
        let mut gap = if self.current.is_empty() {
            0.0
        } else {
            self.pending_gap
        };
        if !self.current.is_empty()
            && self.cursor + gap + height > self.layout.usable_height() + EPSILON
        {
            self.new_page();
            gap = 0.0;
        }
        self.pending_gap = 0.0;
        gap
    }

    fn new_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.pages.push(page);
        self.cursor = 0.0;
    }

    fn place(&mut self, line: LineBox) {
        let height = line.size * self.layout.line_spacing;
        let gap = self.reserve(height);
        let top = self.page_height - self.layout.margin - self.cursor - gap;
        self.cursor += gap + height;

        let baseline = top - line.size;
        let mut segments = Vec::with_capacity(line.pieces.len() + 1);
        if let Some((marker_indent, marker)) = self.pending_marker.take() {
            segments.push(Segment {
                font: marker.font,
                size: line.size,
                x: self.layout.margin + marker_indent,
                text: marker.text,
            });
        }
        let mut x = self.layout.margin + line.indent;
        for piece in line.pieces {
            let width = piece.font.text_width(&piece.text, line.size);
            segments.push(Segment {
                font: piece.font,
                size: line.size,
                x,
                text: piece.text,
            });
            x += width;
        }
        self.current.elements.push(PageElement::Text(TextLine {
            baseline,
            height,
            segments,
        }));
    }
}

fn bullet() -> Piece {
    Piece {
        font: Font::Regular,
        text: "\u{2022}".to_string(),
    }
}

/// Split inline content into words, keeping per-piece faces.
fn tokenize(content: &[InlineContent], base: Font) -> Vec<Token> {
    let mut tokenizer = Tokenizer::default();
    for item in content {
        match item {
            InlineContent::Text(run) => tokenizer.text(&run.text, Font::for_style(base, &run.style)),
            InlineContent::Link { text, url, .. } => {
                tokenizer.text(text, base);
                if url != text {
                    tokenizer.text(&format!(" ({})", url), base);
                }
            }
            InlineContent::LineBreak => tokenizer.line_break(),
        }
    }
    tokenizer.finish()
}

#[derive(Default)]
struct Tokenizer {
    tokens: Vec<Token>,
    word: Vec<Piece>,
    space_before: bool,
    pending_space: bool,
}

impl Tokenizer {
    fn text(&mut self, text: &str, font: Font) {
        for c in text.chars() {
            if c.is_whitespace() {
                self.flush();
                self.pending_space = true;
                continue;
            }
            if self.word.is_empty() {
                self.space_before = self.pending_space;
                self.pending_space = false;
            }
            append_char(&mut self.word, font, c);
        }
    }

    fn line_break(&mut self) {
        self.flush();
        self.pending_space = false;
        self.tokens.push(Token::Break);
    }

    fn flush(&mut self) {
        if !self.word.is_empty() {
            self.tokens.push(Token::Word {
                pieces: std::mem::take(&mut self.word),
                space_before: self.space_before,
            });
        }
    }

    fn finish(mut self) -> Vec<Token> {
        self.flush();
        self.tokens
    }
}

/// Greedy word wrap. Words wider than a whole line are broken by characters.
fn wrap(tokens: &[Token], base: Font, size: f32, width: f32) -> Vec<Vec<Piece>> {
    let mut lines = Vec::new();
    let mut line: Vec<Piece> = Vec::new();
    let mut line_width = 0.0f32;

    for token in tokens {
        let (pieces, space_before) = match token {
            Token::Break => {
                lines.push(std::mem::take(&mut line));
                line_width = 0.0;
                continue;
            }
            Token::Word {
                pieces,
                space_before,
            } => (pieces, *space_before),
        };

        let word_width: f32 = pieces.iter().map(|p| p.font.text_width(&p.text, size)).sum();
        let space_font = line.last().map(|p| p.font).unwrap_or(base);
        let space_width = if space_before && !line.is_empty() {
            space_font.char_width(' ', size)
        } else {
            0.0
        };

        if !line.is_empty() && line_width + space_width + word_width > width + EPSILON {
            lines.push(std::mem::take(&mut line));
            line_width = 0.0;
        }

        if line.is_empty() && word_width > width + EPSILON {
            // Overlong word: full-width chunks, the tail stays open for more words
            let mut chunks: Vec<Vec<Piece>> = Vec::new();
            let mut chunk: Vec<Piece> = Vec::new();
            let mut chunk_width = 0.0f32;
            for piece in pieces {
                for c in piece.text.chars() {
                    let w = piece.font.char_width(c, size);
                    if !chunk.is_empty() && chunk_width + w > width + EPSILON {
                        chunks.push(std::mem::take(&mut chunk));
                        chunk_width = 0.0;
                    }
                    append_char(&mut chunk, piece.font, c);
                    chunk_width += w;
                }
            }
            lines.extend(chunks);
            line = chunk;
            line_width = chunk_width;
            continue;
        }

        if !line.is_empty() && space_before {
            append_char(&mut line, space_font, ' ');
            line_width += space_width;
        }
        for piece in pieces {
            for c in piece.text.chars() {
                append_char(&mut line, piece.font, c);
            }
        }
        line_width += word_width;
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn append_char(line: &mut Vec<Piece>, font: Font, c: char) {
    match line.last_mut() {
        Some(piece) if piece.font == font => piece.text.push(c),
        _ => line.push(Piece {
            font,
            text: c.to_string(),
        }),
    }
}

/// Hard-wrap preformatted text by characters.
fn break_chars(text: &str, font: Font, size: f32, width: f32) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut chunk_width = 0.0f32;
    for c in text.chars() {
        let w = font.char_width(c, size);
        if !chunk.is_empty() && chunk_width + w > width + EPSILON {
            chunks.push(std::mem::take(&mut chunk));
            chunk_width = 0.0;
        }
        chunk.push(c);
        chunk_width += w;
    }
    // An empty source line still takes vertical space
    chunks.push(chunk);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Heading, List, ListItem, Paragraph, TextRun};
    use crate::render::PageSize;

    fn paragraphs(count: usize) -> (Document, Vec<String>) {
        let mut doc = Document::new();
        let mut texts = Vec::new();
        for i in 0..count {
            let text = format!(
                "Paragraph {} has several words of body text so that it wraps across more than one line on a letter page.",
                i
            );
            doc.add_block(Block::paragraph(text.clone()));
            texts.push(text);
        }
        (doc, texts)
    }

    fn nested_list(depth: usize) -> Document {
        let mut list = List::unordered();
        list.push_text(format!("level {}", depth - 1));
        for level in (0..depth - 1).rev() {
            let mut item = ListItem::with_text(format!("level {}", level));
            item.blocks.push(Block::List(list));
            list = List::unordered();
            list.items.push(item);
        }
        let mut doc = Document::new();
        doc.add_block(Block::List(list));
        doc
    }

    #[test]
    fn test_deep_nesting_stays_inside_margins() {
        let layout = PageLayout::default();
        let (page_width, _) = layout.size.dimensions();
        let pages = paginate(&nested_list(40), &layout);

        let mut shown = String::new();
        for line in pages.iter().flat_map(|p| p.lines()) {
            for segment in &line.segments {
                let right = segment.x + segment.font.text_width(&segment.text, segment.size);
                assert!(segment.x >= layout.margin - EPSILON, "{:?}", segment);
                assert!(right <= page_width - layout.margin + EPSILON, "{:?}", segment);
            }
            shown.push_str(&line.text());
            shown.push('\n');
        }

        // Every level is drawn whole, in order
        let mut from = 0;
        for level in 0..40 {
            let needle = format!("level {}\n", level);
            let at = shown[from..]
                .find(&needle)
                .unwrap_or_else(|| panic!("level {} missing", level));
            from += at + needle.len();
        }
    }

    #[test]
    fn test_deep_quote_rule_has_positive_length() {
        let mut block = Block::HorizontalRule;
        for _ in 0..40 {
            block = Block::BlockQuote {
                blocks: vec![block],
            };
        }
        let mut doc = Document::new();
        doc.add_block(block);

        let pages = paginate(&doc, &PageLayout::default());
        match pages[0].elements.as_slice() {
            [PageElement::Rule { x1, x2, .. }] => assert!(x1 < x2),
            other => panic!("unexpected elements {:?}", other),
        }
    }

    #[test]
    fn test_empty_document_has_one_blank_page() {
        let pages = paginate(&Document::new(), &PageLayout::default());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }

    #[test]
    fn test_short_document_fits_one_page() {
        let (doc, _) = paragraphs(3);
        let pages = paginate(&doc, &PageLayout::default());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].lines().count() >= 3);
    }

    #[test]
    fn test_overflow_creates_pages_without_losing_lines() {
        let (doc, texts) = paragraphs(120);
        let layout = PageLayout::default();
        let pages = paginate(&doc, &layout);
        assert!(pages.len() > 1);

        // Every word comes back in order, none split
        let words: Vec<String> = pages
            .iter()
            .flat_map(|p| p.lines())
            .flat_map(|l| {
                l.text()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        let expected: Vec<String> = texts
            .iter()
            .flat_map(|t| t.split_whitespace().map(str::to_string))
            .collect();
        assert_eq!(words, expected);
    }

    #[test]
    fn test_lines_stay_inside_the_page() {
        let (doc, _) = paragraphs(120);
        let layout = PageLayout::default();
        let (_, height) = layout.size.dimensions();
        for page in paginate(&doc, &layout) {
            for line in page.lines() {
                let top = line.baseline + line.segments[0].size;
                let bottom = top - line.height;
                assert!(top <= height - layout.margin + EPSILON);
                assert!(bottom >= layout.margin - EPSILON);
                for segment in &line.segments {
                    let right = segment.x + segment.font.text_width(&segment.text, segment.size);
                    assert!(right <= layout.size.dimensions().0 - layout.margin + 1.0);
                }
            }
        }
    }

    #[test]
    fn test_spacing_dropped_at_page_top() {
        let (doc, _) = paragraphs(120);
        let layout = PageLayout::default();
        let expected = layout.size.dimensions().1 - layout.margin - layout.body_font_size;
        for page in paginate(&doc, &layout) {
            let first = page.lines().next().unwrap();
            assert!((first.baseline - expected).abs() < EPSILON);
        }
    }

    #[test]
    fn test_heading_fonts() {
        let mut doc = Document::new();
        doc.add_block(Block::Heading(Heading::new(1, "Big")));
        doc.add_block(Block::Heading(Heading::new(3, "Small")));
        let mut p = Paragraph::with_text("plain ");
        p.add_run(TextRun::code("code"));
        doc.add_block(Block::Paragraph(p));

        let pages = paginate(&doc, &PageLayout::default());
        let lines: Vec<_> = pages[0].lines().collect();
        assert_eq!(lines[0].segments[0].font, Font::Bold);
        assert_eq!(lines[0].segments[0].size, 24.0);
        assert_eq!(lines[1].segments[0].size, 16.0);
        assert_eq!(lines[2].segments[0].font, Font::Regular);
        assert_eq!(lines[2].segments[1].font, Font::Mono);
        assert_eq!(lines[2].text(), "plain code");
    }

    #[test]
    fn test_overlong_word_broken() {
        let mut doc = Document::new();
        doc.add_block(Block::paragraph("x".repeat(400)));
        let layout = PageLayout::default().with_size(PageSize::A4);
        let pages = paginate(&doc, &layout);
        let lines: Vec<_> = pages[0].lines().collect();
        assert!(lines.len() > 1);
        let total: usize = lines.iter().map(|l| l.text().len()).sum();
        assert_eq!(total, 400);
        for line in lines {
            let width: f32 = line
                .segments
                .iter()
                .map(|s| s.font.text_width(&s.text, s.size))
                .sum();
            assert!(width <= layout.usable_width() + EPSILON);
        }
    }

    #[test]
    fn test_list_markers_and_code_lines() {
        let mut list = List::ordered(3);
        list.push_text("three");
        list.push_text("four");
        let mut doc = Document::new();
        doc.add_block(Block::List(list));
        doc.add_block(Block::code(None, "a\n\n\tb"));

        let pages = paginate(&doc, &PageLayout::default());
        let texts: Vec<String> = pages[0].lines().map(TextLine::text).collect();
        assert_eq!(texts, vec!["3.three", "4.four", "a", "", "    b"]);

        let first = pages[0].lines().next().unwrap();
        assert_eq!(first.segments[1].x - first.segments[0].x, NEST_INDENT);
    }

    #[test]
    fn test_line_breaks_force_new_lines() {
        let mut p = Paragraph::with_text("one");
        p.add_line_break();
        p.add_text("two");
        let mut doc = Document::new();
        doc.add_block(Block::Paragraph(p));
        let pages = paginate(&doc, &PageLayout::default());
        let texts: Vec<String> = pages[0].lines().map(TextLine::text).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }
}
