//! Markdown reader built on pulldown-cmark.
//!
//! pulldown-cmark emits a flat stream of start/end events; the tree builder
//! below keeps a stack of open containers and folds the stream into the
//! document model. Tight list items carry their text without a paragraph
//! wrapper, so an implicit paragraph is opened on demand and closed at the
//! next block boundary.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::error::{Error, Result};
use crate::format::Format;
use crate::model::{
    Block, CodeBlock, Document, Heading, InlineContent, List, ListItem, Metadata, Paragraph,
    TextStyle,
};

use super::text::{decode_utf8, push_run, trim_inline, TextNormalizer};
use super::{DocumentParser, ParseOptions};

/// Markdown source reader.
#[derive(Debug, Clone, Default)]
pub struct MarkdownParser {
    _private: (),
}

impl MarkdownParser {
    /// Create a new Markdown parser.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl DocumentParser for MarkdownParser {
    fn format(&self) -> Format {
        Format::Markdown
    }

    fn parse(&self, bytes: &[u8], options: &ParseOptions) -> Result<Document> {
        let text = decode_utf8(bytes)?;
        parse_markdown(text, options)
    }
}

/// Parse Markdown text into a document.
///
/// Syntax the model has no node for (tables, footnotes, raw HTML, images)
/// degrades to plain text. The only failure is nesting deeper than
/// [`ParseOptions::max_depth`].
pub fn parse_markdown(text: &str, options: &ParseOptions) -> Result<Document> {
    let parser = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH);
    let mut builder = TreeBuilder::new(
        TextNormalizer::new(options.normalize_unicode),
        options.max_depth,
    );
    for event in parser {
        builder.handle(event)?;
    }

    let mut doc = Document {
        metadata: Metadata::parsed_from(Format::Markdown),
        blocks: builder.finish(),
    };
    doc.metadata.title = doc.title();
    log::debug!("parsed markdown into {} blocks", doc.blocks.len());
    Ok(doc)
}

/// An open container on the builder stack.
enum Frame {
    Root(Vec<Block>),
    Quote(Vec<Block>),
    List(List),
    Item(Vec<Block>),
    Inline {
        kind: InlineKind,
        content: Vec<InlineContent>,
    },
    Code {
        language: Option<String>,
        code: String,
    },
    Link {
        url: String,
        title: Option<String>,
        text: String,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum InlineKind {
    Paragraph,
    Implicit,
    Heading(u8),
}

/// Nesting depth of each inline style.
#[derive(Default)]
struct StyleDepth {
    strong: u32,
    emphasis: u32,
    strikethrough: u32,
}

impl StyleDepth {
    fn current(&self) -> TextStyle {
        TextStyle {
            bold: self.strong > 0,
            italic: self.emphasis > 0,
            strikethrough: self.strikethrough > 0,
            code: false,
        }
    }
}

struct TreeBuilder {
    stack: Vec<Frame>,
    style: StyleDepth,
    normalizer: TextNormalizer,
    /// Open quote, list and item frames
    containers: usize,
    max_depth: usize,
}

impl TreeBuilder {
    fn new(normalizer: TextNormalizer, max_depth: usize) -> Self {
        Self {
            stack: vec![Frame::Root(Vec::new())],
            style: StyleDepth::default(),
            normalizer,
            containers: 0,
            max_depth,
        }
    }

    fn handle(&mut self, event: Event<'_>) -> Result<()> {
        match event {
            Event::Start(tag) => return self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.code_span(&code),
            // Raw markup is kept verbatim as text
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html.replace('\n', " ")),
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.line_break(),
            Event::Rule => {
                self.close_implicit();
                self.push_block(Block::HorizontalRule);
            }
            other => log::debug!("markdown event {:?} has no model node, skipped", other),
        }
        Ok(())
    }

    /// Open a container frame, enforcing the nesting limit.
    fn push_container(&mut self, frame: Frame) -> Result<()> {
        if self.containers >= self.max_depth {
            return Err(Error::Parse(format!(
                "nesting deeper than {}",
                self.max_depth
            )));
        }
        self.containers += 1;
        self.stack.push(frame);
        Ok(())
    }

    fn start(&mut self, tag: Tag<'_>) -> Result<()> {
        match tag {
            Tag::Paragraph | Tag::HtmlBlock => {
                self.close_implicit();
                self.open_inline(InlineKind::Paragraph);
            }
            Tag::Heading { level, .. } => {
                self.close_implicit();
                self.open_inline(InlineKind::Heading(level as u8));
            }
            Tag::BlockQuote(_) => {
                self.close_implicit();
                self.push_container(Frame::Quote(Vec::new()))?;
            }
            Tag::CodeBlock(kind) => {
                self.close_implicit();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.stack.push(Frame::Code {
                    language,
                    code: String::new(),
                });
            }
            Tag::List(start) => {
                self.close_implicit();
                let list = match start {
                    Some(n) => List::ordered(u32::try_from(n).unwrap_or(u32::MAX)),
                    None => List::unordered(),
                };
                self.push_container(Frame::List(list))?;
            }
            Tag::Item => {
                self.close_implicit();
                self.push_container(Frame::Item(Vec::new()))?;
            }
            Tag::Emphasis => self.style.emphasis += 1,
            Tag::Strong => self.style.strong += 1,
            Tag::Strikethrough => self.style.strikethrough += 1,
            Tag::Link {
                dest_url, title, ..
            } => {
                self.ensure_inline();
                self.stack.push(Frame::Link {
                    url: dest_url.to_string(),
                    title: (!title.is_empty()).then(|| title.to_string()),
                    text: String::new(),
                });
            }
            // Image alt text arrives as ordinary text events
            Tag::Image { .. } => {}
            other => log::debug!("markdown tag {:?} degraded to text", other),
        }
        Ok(())
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::HtmlBlock | TagEnd::Heading(_) => self.close_top(),
            TagEnd::BlockQuote(_) | TagEnd::Item | TagEnd::List(_) => {
                self.close_implicit();
                self.close_top();
            }
            TagEnd::CodeBlock | TagEnd::Link => self.close_top(),
            TagEnd::Emphasis => self.style.emphasis = self.style.emphasis.saturating_sub(1),
            TagEnd::Strong => self.style.strong = self.style.strong.saturating_sub(1),
            TagEnd::Strikethrough => {
                self.style.strikethrough = self.style.strikethrough.saturating_sub(1)
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        match self.stack.last_mut() {
            Some(Frame::Code { code, .. }) => {
                code.push_str(text);
                return;
            }
            Some(Frame::Link { text: link_text, .. }) => {
                link_text.push_str(text);
                return;
            }
            _ => {}
        }
        let text = self.normalizer.normalize(text);
        let style = self.style.current();
        self.push_styled(&text, style);
    }

    fn code_span(&mut self, code: &str) {
        if let Some(Frame::Link { text, .. }) = self.stack.last_mut() {
            text.push_str(code);
            return;
        }
        let style = TextStyle {
            code: true,
            ..self.style.current()
        };
        self.push_styled(code, style);
    }

    fn push_styled(&mut self, text: &str, style: TextStyle) {
        self.ensure_inline();
        if let Some(Frame::Inline { content, .. }) = self.stack.last_mut() {
            push_run(content, text, style);
        }
    }

    fn line_break(&mut self) {
        if let Some(Frame::Link { text, .. }) = self.stack.last_mut() {
            text.push(' ');
            return;
        }
        self.ensure_inline();
        if let Some(Frame::Inline { content, .. }) = self.stack.last_mut() {
            content.push(InlineContent::LineBreak);
        }
    }

    fn open_inline(&mut self, kind: InlineKind) {
        self.stack.push(Frame::Inline {
            kind,
            content: Vec::new(),
        });
    }

    /// Open an implicit paragraph if the top of the stack cannot hold inline content.
    fn ensure_inline(&mut self) {
        if matches!(
            self.stack.last(),
            Some(Frame::Root(_) | Frame::Quote(_) | Frame::Item(_) | Frame::List(_))
        ) {
            self.open_inline(InlineKind::Implicit);
        }
    }

    fn close_implicit(&mut self) {
        if matches!(
            self.stack.last(),
            Some(Frame::Inline {
                kind: InlineKind::Implicit,
                ..
            })
        ) {
            self.close_top();
        }
    }

    /// Pop the innermost container and attach it to its parent.
    fn close_top(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        if matches!(frame, Frame::Quote(_) | Frame::List(_) | Frame::Item(_)) {
            self.containers -= 1;
        }
        match frame {
            Frame::Root(blocks) => self.stack.push(Frame::Root(blocks)),
            Frame::Quote(blocks) => self.push_block(Block::BlockQuote { blocks }),
            Frame::List(list) => self.push_block(Block::List(list)),
            Frame::Item(blocks) => self.push_item(ListItem { blocks }),
            Frame::Inline { kind, mut content } => {
                trim_inline(&mut content);
                match kind {
                    InlineKind::Heading(level) => {
                        self.push_block(Block::Heading(Heading { level, content }))
                    }
                    _ if content.is_empty() => {}
                    _ => self.push_block(Block::Paragraph(Paragraph::from_content(content))),
                }
            }
            Frame::Code { language, code } => self.push_block(Block::CodeBlock(CodeBlock {
                language,
                code: code.trim_end_matches('\n').to_string(),
            })),
            Frame::Link { url, title, text } => {
                let text = self.normalizer.normalize(&text);
                if let Some(Frame::Inline { content, .. }) = self.stack.last_mut() {
                    content.push(InlineContent::Link { text, url, title });
                }
            }
        }
    }

    fn push_block(&mut self, block: Block) {
        for frame in self.stack.iter_mut().rev() {
            match frame {
                Frame::Root(blocks) | Frame::Quote(blocks) | Frame::Item(blocks) => {
                    blocks.push(block);
                    return;
                }
                Frame::List(list) => {
                    list.items.push(ListItem {
                        blocks: vec![block],
                    });
                    return;
                }
                _ => {}
            }
        }
    }

    fn push_item(&mut self, item: ListItem) {
        if let Some(Frame::List(list)) = self.stack.last_mut() {
            list.items.push(item);
        } else {
            let mut list = List::unordered();
            list.items.push(item);
            self.push_block(Block::List(list));
        }
    }

    fn finish(mut self) -> Vec<Block> {
        while self.stack.len() > 1 {
            self.close_top();
        }
        match self.stack.pop() {
            Some(Frame::Root(blocks)) => blocks,
            _ => Vec::new(),
        }
    }
}
