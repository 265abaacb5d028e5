//! Markdown rendering.

use crate::error::Result;
use crate::format::Format;
use crate::model::{Block, CodeBlock, Document, InlineContent, List, ListItem, TextRun, TextStyle};

use super::{DocumentRenderer, RenderOptions};

/// Convert a document to Markdown.
pub fn to_markdown(doc: &Document, options: &RenderOptions) -> Result<String> {
    doc.validate()?;
    let renderer = MarkdownWriter { options };
    let mut output = String::new();

    if options.include_frontmatter {
        output.push_str(&doc.metadata.to_yaml_frontmatter());
        output.push('\n');
    }

    let body = renderer.render_blocks(&doc.blocks);
    if !body.is_empty() {
        output.push_str(&body);
        output.push('\n');
    }
    Ok(output)
}

/// Markdown output.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    _private: (),
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl DocumentRenderer for MarkdownRenderer {
    fn format(&self) -> Format {
        Format::Markdown
    }

    fn render(&self, doc: &Document, options: &RenderOptions) -> Result<Vec<u8>> {
        to_markdown(doc, options).map(String::into_bytes)
    }
}

struct MarkdownWriter<'a> {
    options: &'a RenderOptions,
}

impl MarkdownWriter<'_> {
    /// Render a block sequence, blocks separated by a blank line.
    fn render_blocks(&self, blocks: &[Block]) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(blocks.len());
        let mut previous_list: Option<(bool, bool)> = None;

        for block in blocks {
            let rendered = match block {
                Block::List(list) => {
                    // Two adjacent lists of the same kind would merge on re-parse,
                    // so the second one switches delimiter.
                    let alternate = matches!(previous_list, Some((ordered, alt)) if ordered == list.ordered && !alt);
                    previous_list = Some((list.ordered, alternate));
                    self.render_list(list, alternate)
                }
                other => {
                    previous_list = None;
                    self.render_block(other)
                }
            };
            if !rendered.is_empty() {
                parts.push(rendered);
            }
        }
        parts.join("\n\n")
    }

    fn render_block(&self, block: &Block) -> String {
        match block {
            Block::Paragraph(p) => {
                if p.is_empty() {
                    return String::new();
                }
                let text = self.render_inline(&p.content);
                if self.options.escape_special_chars {
                    escape_line_start(&text)
                } else {
                    text
                }
            }
            Block::Heading(h) => {
                let text = self.render_inline(&h.content).replace("\\\n", " ");
                format!("{} {}", "#".repeat(h.level as usize), text)
                    .trim_end()
                    .to_string()
            }
            Block::List(list) => self.render_list(list, false),
            // Rejected by validation before rendering starts
            Block::ListItem(item) => self.render_item(item, &self.options.list_marker.to_string()),
            Block::CodeBlock(code) => render_code_block(code),
            Block::BlockQuote { blocks } => prefix_lines(&self.render_blocks(blocks), "> ", ">"),
            Block::HorizontalRule => "---".to_string(),
        }
    }

    fn render_list(&self, list: &List, alternate: bool) -> String {
        let bullet = match (self.options.list_marker, alternate) {
            (marker, false) => marker,
            ('*', true) => '-',
            (_, true) => '*',
        };
        let delimiter = if alternate { ')' } else { '.' };

        list.items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let marker = if list.ordered {
                    format!("{}{}", list.start as usize + i, delimiter)
                } else {
                    bullet.to_string()
                };
                self.render_item(item, &marker)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render one list item. Continuation lines are indented to the item's
    /// content column so nested blocks stay inside the item.
    fn render_item(&self, item: &ListItem, marker: &str) -> String {
        let indent = " ".repeat(marker.len() + 1);
        let mut body = String::new();
        for block in &item.blocks {
            let rendered = self.render_block(block);
            if rendered.is_empty() {
                continue;
            }
            if !body.is_empty() {
                body.push_str(if tight_after_text(block) { "\n" } else { "\n\n" });
            }
            body.push_str(&rendered);
        }

        if body.is_empty() {
            return marker.to_string();
        }
        let body = prefix_lines(&body, &indent, "");
        format!("{} {}", marker, body.strip_prefix(&indent).unwrap_or(&body))
    }

    fn render_inline(&self, content: &[InlineContent]) -> String {
        let mut output = String::new();
        for item in content {
            match item {
                InlineContent::Text(run) => self.render_text_run(&mut output, run),
                InlineContent::LineBreak => output.push_str("\\\n"),
                InlineContent::Link { text, url, title } => {
                    let text = if self.options.escape_special_chars {
                        escape_markdown(text)
                    } else {
                        text.clone()
                    };
                    let url = if url.contains(' ') || url.contains(')') {
                        format!("<{}>", url)
                    } else {
                        url.clone()
                    };
                    match title {
                        Some(t) => output.push_str(&format!(
                            "[{}]({} \"{}\")",
                            text,
                            url,
                            t.replace('"', "\\\"")
                        )),
                        None => output.push_str(&format!("[{}]({})", text, url)),
                    }
                }
            }
        }
        output
    }

    fn render_text_run(&self, output: &mut String, run: &TextRun) {
        if run.text.is_empty() {
            return;
        }

        // Emphasis delimiters may not touch whitespace on the inside.
        let core = run.text.trim();
        if core.is_empty() || !run.style.has_styling() {
            output.push_str(&self.escape(&run.text));
            return;
        }
        let leading = &run.text[..run.text.len() - run.text.trim_start().len()];
        let trailing = &run.text[run.text.trim_end().len()..];

        let text = if run.style.code {
            code_span(core)
        } else {
            self.escape(core)
        };
        output.push_str(leading);
        output.push_str(&apply_text_style(&text, &run.style));
        output.push_str(trailing);
    }

    fn escape(&self, text: &str) -> String {
        if self.options.escape_special_chars {
            escape_markdown(text)
        } else {
            text.to_string()
        }
    }
}

/// A nested list may follow item text on the next line only when it can
/// interrupt a paragraph: any bullet list, or an ordered list starting at 1.
fn tight_after_text(block: &Block) -> bool {
    match block {
        Block::List(list) => !list.ordered || list.start == 1,
        _ => false,
    }
}

fn apply_text_style(text: &str, style: &TextStyle) -> String {
    let mut result = text.to_string();

    // Apply styles (innermost first)
    if style.strikethrough {
        result = format!("~~{}~~", result);
    }
    if style.italic {
        result = format!("*{}*", result);
    }
    if style.bold {
        result = format!("**{}**", result);
    }

    result
}

/// Wrap inline code in enough backticks to hold any backtick run inside it.
fn code_span(code: &str) -> String {
    let ticks = "`".repeat(longest_backtick_run(code) + 1);
    if code.starts_with('`') || code.ends_with('`') {
        format!("{} {} {}", ticks, code, ticks)
    } else {
        format!("{}{}{}", ticks, code, ticks)
    }
}

fn render_code_block(code: &CodeBlock) -> String {
    let fence = "`".repeat((longest_backtick_run(&code.code) + 1).max(3));
    let language = code.language.as_deref().unwrap_or("");
    let body = code.code.trim_end_matches('\n');
    if body.is_empty() {
        format!("{}{}\n{}", fence, language, fence)
    } else {
        format!("{}{}\n{}\n{}", fence, language, body, fence)
    }
}

fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Prefix every line; empty lines get `empty_prefix` instead.
fn prefix_lines(text: &str, prefix: &str, empty_prefix: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                empty_prefix.to_string()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape special Markdown characters.
/// Only escape characters that could be misinterpreted as Markdown syntax.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            // Core formatting that must be escaped
            '\\' | '`' | '*' | '_' | '~' |
            // Brackets for links, angle bracket for inline HTML and autolinks
            '[' | ']' | '<' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

/// Escape a paragraph start that would otherwise open a heading, quote,
/// list or rule.
fn escape_line_start(text: &str) -> String {
    if text.starts_with(['#', '>', '-', '+', '=']) {
        return format!("\\{}", text);
    }
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && text[digits..].starts_with(['.', ')']) {
        return format!("{}\\{}", &text[..digits], &text[digits..]);
    }
    text.to_string()
}
