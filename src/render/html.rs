//! HTML rendering.

use crate::error::Result;
use crate::format::Format;
use crate::model::{Block, Document, InlineContent, List, ListItem, TextRun};

use super::{DocumentRenderer, RenderOptions};

/// Convert a document to HTML.
///
/// Produces a fragment unless [`RenderOptions::html_standalone`] is set, in
/// which case a complete document with `<head>` and `<title>` is emitted.
pub fn to_html(doc: &Document, options: &RenderOptions) -> Result<String> {
    doc.validate()?;
    let mut body = String::new();
    render_blocks(&mut body, &doc.blocks);

    if !options.html_standalone {
        return Ok(body);
    }

    let title = doc.title().unwrap_or_else(|| "Untitled".to_string());
    let mut output = String::with_capacity(body.len() + 160);
    output.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n");
    output.push_str(&format!("<title>{}</title>\n", escape_html(&title)));
    output.push_str("</head>\n<body>\n");
    output.push_str(&body);
    output.push_str("</body>\n</html>\n");
    Ok(output)
}

/// HTML output.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    _private: (),
}

impl HtmlRenderer {
    /// Create a new HTML renderer.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl DocumentRenderer for HtmlRenderer {
    fn format(&self) -> Format {
        Format::Html
    }

    fn render(&self, doc: &Document, options: &RenderOptions) -> Result<Vec<u8>> {
        to_html(doc, options).map(String::into_bytes)
    }
}

fn render_blocks(output: &mut String, blocks: &[Block]) {
    for block in blocks {
        render_block(output, block);
    }
}

fn render_block(output: &mut String, block: &Block) {
    match block {
        Block::Paragraph(p) => {
            if p.is_empty() {
                return;
            }
            output.push_str("<p>");
            render_inline(output, &p.content);
            output.push_str("</p>\n");
        }
        Block::Heading(h) => {
            output.push_str(&format!("<h{}>", h.level));
            render_inline(output, &h.content);
            output.push_str(&format!("</h{}>\n", h.level));
        }
        Block::List(list) => render_list(output, list),
        Block::ListItem(item) => render_item(output, item),
        Block::CodeBlock(code) => {
            match &code.language {
                Some(lang) => output.push_str(&format!(
                    "<pre><code class=\"language-{}\">",
                    escape_html(lang)
                )),
                None => output.push_str("<pre><code>"),
            }
            output.push_str(&escape_html(&code.code));
            if !code.code.is_empty() && !code.code.ends_with('\n') {
                output.push('\n');
            }
            output.push_str("</code></pre>\n");
        }
        Block::BlockQuote { blocks } => {
            output.push_str("<blockquote>\n");
            render_blocks(output, blocks);
            output.push_str("</blockquote>\n");
        }
        Block::HorizontalRule => output.push_str("<hr />\n"),
    }
}

fn render_list(output: &mut String, list: &List) {
    if list.ordered {
        if list.start == 1 {
            output.push_str("<ol>\n");
        } else {
            output.push_str(&format!("<ol start=\"{}\">\n", list.start));
        }
    } else {
        output.push_str("<ul>\n");
    }
    for item in &list.items {
        render_item(output, item);
    }
    output.push_str(if list.ordered { "</ol>\n" } else { "</ul>\n" });
}

/// Items holding a single paragraph (plus nested lists) are written tight,
/// without `<p>`.
fn render_item(output: &mut String, item: &ListItem) {
    let tight = item
        .blocks
        .iter()
        .filter(|b| !b.is_list())
        .count()
        <= 1
        && !matches!(item.blocks.first(), Some(b) if !matches!(b, Block::Paragraph(_)) && !b.is_list());

    output.push_str("<li>");
    for (i, block) in item.blocks.iter().enumerate() {
        match block {
            Block::Paragraph(p) if tight => {
                render_inline(output, &p.content);
            }
            _ => {
                if i == 0 || !output.ends_with('\n') {
                    output.push('\n');
                }
                render_block(output, block);
            }
        }
    }
    output.push_str("</li>\n");
}

fn render_inline(output: &mut String, content: &[InlineContent]) {
    for item in content {
        match item {
            InlineContent::Text(run) => render_text_run(output, run),
            InlineContent::LineBreak => output.push_str("<br />\n"),
            InlineContent::Link { text, url, title } => {
                output.push_str(&format!("<a href=\"{}\"", escape_html(url)));
                if let Some(title) = title {
                    output.push_str(&format!(" title=\"{}\"", escape_html(title)));
                }
                output.push('>');
                output.push_str(&escape_html(text));
                output.push_str("</a>");
            }
        }
    }
}

fn render_text_run(output: &mut String, run: &TextRun) {
    let style = &run.style;
    let mut open = String::new();
    let mut close = String::new();
    for (enabled, tag) in [
        (style.bold, "strong"),
        (style.italic, "em"),
        (style.strikethrough, "del"),
        (style.code, "code"),
    ] {
        if enabled {
            open.push_str(&format!("<{}>", tag));
            close.insert_str(0, &format!("</{}>", tag));
        }
    }
    output.push_str(&open);
    output.push_str(&escape_html(&run.text));
    output.push_str(&close);
}

/// Escape text for use in element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}
