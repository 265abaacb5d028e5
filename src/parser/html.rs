//! HTML reader built on scraper (html5ever DOM).
//!
//! The DOM is walked once. Recognized block elements map to model blocks and
//! recognized inline elements to styled runs and links. Any other element is
//! dropped but its text is kept: block-like containers (`div`, `section`,
//! table cells, ...) delimit implicit paragraphs, everything else flows
//! inline. `script`, `style` and `template` content is discarded.

use scraper::{ElementRef, Html, Node};

use crate::error::{Error, Result};
use crate::format::Format;
use crate::model::{
    Block, CodeBlock, Document, Heading, InlineContent, List, ListItem, Metadata, Paragraph,
    TextStyle,
};

use super::text::{decode_utf8, push_run, trim_inline, TextNormalizer};
use super::{DocumentParser, ErrorMode, ParseOptions};

/// Elements whose content never reaches the document.
const SKIPPED_TAGS: &[&str] = &["script", "style", "template", "noscript", "iframe", "object"];

/// Unmapped elements that still delimit paragraphs. Any other unmapped
/// element flows inline.
const CONTAINER_TAGS: &[&str] = &[
    "html", "body", "main", "div", "section", "article", "header", "footer", "nav", "aside",
    "address", "center", "details", "summary", "dialog", "menu", "figure", "figcaption", "form",
    "fieldset", "dl", "dt", "dd", "table", "caption", "thead", "tbody", "tfoot", "tr", "td", "th",
];

/// HTML source reader.
#[derive(Debug, Clone, Default)]
pub struct HtmlParser {
    _private: (),
}

impl HtmlParser {
    /// Create a new HTML parser.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl DocumentParser for HtmlParser {
    fn format(&self) -> Format {
        Format::Html
    }

    fn parse(&self, bytes: &[u8], options: &ParseOptions) -> Result<Document> {
        let text = decode_utf8(bytes)?;
        parse_html(text, options)
    }
}

/// Parse HTML markup (a full document or a fragment) into a document.
///
/// In [`ErrorMode::Strict`] any error the HTML tokenizer had to recover from
/// fails the parse; in lenient mode the repaired tree is used.
pub fn parse_html(text: &str, options: &ParseOptions) -> Result<Document> {
    let html = if is_full_document(text) {
        Html::parse_document(text)
    } else {
        Html::parse_fragment(text)
    };

    if !html.errors.is_empty() {
        match options.error_mode {
            ErrorMode::Strict => {
                return Err(Error::Parse(format!(
                    "malformed HTML ({} errors, first: {})",
                    html.errors.len(),
                    html.errors[0]
                )));
            }
            ErrorMode::Lenient => {
                log::debug!("repaired {} HTML parse errors", html.errors.len());
            }
        }
    }

    let normalizer = TextNormalizer::new(options.normalize_unicode);
    let mut walker = DomWalker {
        normalizer: &normalizer,
        title: None,
        depth: 0,
        max_depth: options.max_depth,
    };
    let mut sink = BlockSink::default();
    walker.walk_blocks(html.root_element(), &mut sink, TextStyle::default())?;

    let mut doc = Document {
        metadata: Metadata::parsed_from(Format::Html),
        blocks: sink.finish(),
    };
    doc.metadata.title = walker.title.take().or_else(|| doc.title());
    log::debug!("parsed html into {} blocks", doc.blocks.len());
    Ok(doc)
}

fn is_full_document(text: &str) -> bool {
    let head: String = text
        .trim_start()
        .chars()
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

/// Collects blocks, buffering loose inline content into an implicit paragraph.
#[derive(Default)]
struct BlockSink {
    blocks: Vec<Block>,
    inline: Vec<InlineContent>,
    /// The last block is a list synthesized for stray `<li>` elements.
    stray_list: bool,
}

impl BlockSink {
    fn flush(&mut self) {
        let mut content = std::mem::take(&mut self.inline);
        trim_inline(&mut content);
        if !content.is_empty() {
            self.stray_list = false;
            self.blocks
                .push(Block::Paragraph(Paragraph::from_content(content)));
        }
    }

    fn push_block(&mut self, block: Block) {
        self.flush();
        self.stray_list = false;
        self.blocks.push(block);
    }

    fn push_stray_item(&mut self, item: ListItem) {
        self.flush();
        if self.stray_list {
            if let Some(Block::List(list)) = self.blocks.last_mut() {
                list.items.push(item);
                return;
            }
        }
        let mut list = List::unordered();
        list.items.push(item);
        self.blocks.push(Block::List(list));
        self.stray_list = true;
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

struct DomWalker<'n> {
    normalizer: &'n TextNormalizer,
    title: Option<String>,
    depth: usize,
    max_depth: usize,
}

impl DomWalker<'_> {
    /// Enter one element level. Every recursive walk goes through here.
    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(Error::Parse(format!(
                "nesting deeper than {}",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn walk_blocks(&mut self, el: ElementRef<'_>, sink: &mut BlockSink, style: TextStyle) -> Result<()> {
        self.descend()?;
        for child in el.children() {
            match child.value() {
                Node::Text(text) => self.inline_text(text, style, &mut sink.inline),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.block_element(child_el, sink, style)?;
                    }
                }
                _ => {}
            }
        }
        self.ascend();
        Ok(())
    }

    fn block_element(&mut self, el: ElementRef<'_>, sink: &mut BlockSink, style: TextStyle) -> Result<()> {
        let name = el.value().name();
        if let Some(level) = heading_level(name) {
            let content = self.collect_inline(el, style)?;
            sink.push_block(Block::Heading(Heading { level, content }));
            return Ok(());
        }

        match name {
            "p" => {
                sink.flush();
                let content = self.collect_inline(el, style)?;
                if !content.is_empty() {
                    sink.push_block(Block::Paragraph(Paragraph::from_content(content)));
                }
            }
            "ul" | "ol" => {
                let list = self.list(el, name == "ol", style)?;
                sink.push_block(Block::List(list));
            }
            "li" => {
                log::warn!("<li> outside of a list, wrapping it in <ul>");
                let item = self.list_item(el, style)?;
                sink.push_stray_item(item);
            }
            "pre" => sink.push_block(self.code_block(el)),
            "blockquote" => {
                let mut inner = BlockSink::default();
                self.walk_blocks(el, &mut inner, style)?;
                sink.push_block(Block::BlockQuote {
                    blocks: inner.finish(),
                });
            }
            "hr" => sink.push_block(Block::HorizontalRule),
            "title" => {
                let title = self.normalizer.collapse(&el.text().collect::<String>());
                let title = title.trim();
                if !title.is_empty() && self.title.is_none() {
                    self.title = Some(title.to_string());
                }
            }
            "head" => {
                // Only <title> is of interest; anything else is dropped.
                let mut ignored = BlockSink::default();
                self.walk_blocks(el, &mut ignored, style)?;
            }
            _ if SKIPPED_TAGS.contains(&name) => {}
            _ if CONTAINER_TAGS.contains(&name) => {
                sink.flush();
                self.walk_blocks(el, sink, style)?;
                sink.flush();
            }
            _ => self.inline_element(el, style, &mut sink.inline)?,
        }
        Ok(())
    }

    fn collect_inline(&mut self, el: ElementRef<'_>, style: TextStyle) -> Result<Vec<InlineContent>> {
        let mut content = Vec::new();
        self.walk_inline(el, style, &mut content)?;
        trim_inline(&mut content);
        Ok(content)
    }

    fn walk_inline(
        &mut self,
        el: ElementRef<'_>,
        style: TextStyle,
        content: &mut Vec<InlineContent>,
    ) -> Result<()> {
        self.descend()?;
        for child in el.children() {
            match child.value() {
                Node::Text(text) => self.inline_text(text, style, content),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.inline_element(child_el, style, content)?;
                    }
                }
                _ => {}
            }
        }
        self.ascend();
        Ok(())
    }

    fn inline_element(
        &mut self,
        el: ElementRef<'_>,
        style: TextStyle,
        content: &mut Vec<InlineContent>,
    ) -> Result<()> {
        let name = el.value().name();
        match name {
            "em" | "i" => self.walk_inline(
                el,
                TextStyle {
                    italic: true,
                    ..style
                },
                content,
            )?,
            "strong" | "b" => self.walk_inline(el, TextStyle { bold: true, ..style }, content)?,
            "del" | "s" | "strike" => self.walk_inline(
                el,
                TextStyle {
                    strikethrough: true,
                    ..style
                },
                content,
            )?,
            "code" | "kbd" | "samp" | "tt" => {
                let text = self.normalizer.collapse(&el.text().collect::<String>());
                push_run(content, &text, TextStyle { code: true, ..style });
            }
            "a" => {
                let text = self.normalizer.collapse(&el.text().collect::<String>());
                match el.value().attr("href") {
                    Some(href) => content.push(InlineContent::Link {
                        text: text.trim().to_string(),
                        url: href.trim().to_string(),
                        title: el.value().attr("title").map(str::to_string),
                    }),
                    // An anchor without a target is just text
                    None => self.inline_text(&text, style, content),
                }
            }
            "br" => content.push(InlineContent::LineBreak),
            "img" => {
                if let Some(alt) = el.value().attr("alt") {
                    self.inline_text(alt, style, content);
                }
            }
            _ if SKIPPED_TAGS.contains(&name) => {}
            _ => self.walk_inline(el, style, content)?,
        }
        Ok(())
    }

    fn inline_text(&self, text: &str, style: TextStyle, content: &mut Vec<InlineContent>) {
        let collapsed = self.normalizer.collapse(text);
        let collapsed = if collapsed.starts_with(' ') && ends_with_space(content) {
            &collapsed[1..]
        } else {
            collapsed.as_str()
        };
        push_run(content, collapsed, style);
    }

    fn list(&mut self, el: ElementRef<'_>, ordered: bool, style: TextStyle) -> Result<List> {
        self.descend()?;
        let mut list = if ordered {
            let start = el
                .value()
                .attr("start")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(1);
            List::ordered(start)
        } else {
            List::unordered()
        };

        for child in el.children() {
            match child.value() {
                Node::Text(text) => {
                    let text = self.normalizer.collapse(text);
                    if !text.trim().is_empty() {
                        list.push_text(text.trim());
                    }
                }
                Node::Element(_) => {
                    let Some(child_el) = ElementRef::wrap(child) else {
                        continue;
                    };
                    match child_el.value().name() {
                        "li" => list.items.push(self.list_item(child_el, style)?),
                        // A list nested directly in a list belongs to the previous item
                        "ul" | "ol" => {
                            let nested =
                                self.list(child_el, child_el.value().name() == "ol", style)?;
                            match list.items.last_mut() {
                                Some(item) => item.blocks.push(Block::List(nested)),
                                None => list.items.push(ListItem {
                                    blocks: vec![Block::List(nested)],
                                }),
                            }
                        }
                        _ => {
                            let item = self.list_item(child_el, style)?;
                            if !item.blocks.is_empty() {
                                list.items.push(item);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        self.ascend();
        Ok(list)
    }

    fn list_item(&mut self, el: ElementRef<'_>, style: TextStyle) -> Result<ListItem> {
        let mut sink = BlockSink::default();
        self.walk_blocks(el, &mut sink, style)?;
        Ok(ListItem {
            blocks: sink.finish(),
        })
    }

    fn code_block(&self, pre: ElementRef<'_>) -> Block {
        let code_el = pre
            .children()
            .filter_map(ElementRef::wrap)
            .find(|c| c.value().name() == "code");
        let language = code_el
            .and_then(language_class)
            .or_else(|| language_class(pre));
        let code: String = pre.text().collect();
        let code = self.normalizer.normalize(code.trim_end_matches('\n'));
        Block::CodeBlock(CodeBlock { language, code })
    }
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn language_class(el: ElementRef<'_>) -> Option<String> {
    el.value().classes().find_map(|class| {
        class
            .strip_prefix("language-")
            .or_else(|| class.strip_prefix("lang-"))
            .filter(|lang| !lang.is_empty())
            .map(str::to_string)
    })
}

fn ends_with_space(content: &[InlineContent]) -> bool {
    match content.last() {
        Some(InlineContent::Text(run)) => run.text.ends_with(' '),
        Some(InlineContent::LineBreak) | None => true,
        Some(InlineContent::Link { .. }) => false,
    }
}
