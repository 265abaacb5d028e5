//! Document-level types.

use super::{Block, InlineContent, ListItem};
use crate::error::{Error, Result};
use crate::format::Format;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parsed document: the pivot between every parser and every renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata (title, source format, ...)
    pub metadata: Metadata,

    /// Top-level content blocks
    pub blocks: Vec<Block>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block to the document.
    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Check if the document has any blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Title from metadata, falling back to the first level-1 heading.
    pub fn title(&self) -> Option<String> {
        self.metadata.title.clone().or_else(|| {
            self.blocks.iter().find_map(|b| match b {
                Block::Heading(h) if h.level == 1 => Some(h.plain_text()),
                _ => None,
            })
        })
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Append another document's blocks after this one's.
    pub fn append(&mut self, other: Document) {
        if self.metadata.title.is_none() {
            self.metadata.title = other.metadata.title;
        }
        self.blocks.extend(other.blocks);
    }

    /// Check structural invariants required by every renderer.
    ///
    /// Headings must have a level in 1-6 and list items may only appear
    /// inside a list.
    pub fn validate(&self) -> Result<()> {
        validate_blocks(&self.blocks, "document")
    }

    /// Count structural elements and words.
    pub fn stats(&self) -> DocumentStats {
        let mut stats = DocumentStats::default();
        count_blocks(&self.blocks, &mut stats);
        stats
    }
}

fn validate_blocks(blocks: &[Block], context: &str) -> Result<()> {
    for block in blocks {
        match block {
            Block::Heading(h) if !(1..=6).contains(&h.level) => {
                return Err(Error::Render(format!(
                    "heading level {} out of range 1-6",
                    h.level
                )));
            }
            Block::ListItem(_) => {
                return Err(Error::Render(format!(
                    "list item outside of a list (in {})",
                    context
                )));
            }
            Block::List(list) => {
                for item in &list.items {
                    validate_blocks(&item.blocks, "list item")?;
                }
            }
            Block::BlockQuote { blocks } => validate_blocks(blocks, "block quote")?,
            _ => {}
        }
    }
    Ok(())
}

fn count_blocks(blocks: &[Block], stats: &mut DocumentStats) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => {
                stats.paragraph_count += 1;
                count_inline(&p.content, stats);
            }
            Block::Heading(h) => {
                stats.heading_count += 1;
                count_inline(&h.content, stats);
            }
            Block::List(list) => {
                stats.list_count += 1;
                for item in &list.items {
                    count_item(item, stats);
                }
            }
            Block::ListItem(item) => count_item(item, stats),
            Block::CodeBlock(code) => {
                stats.code_block_count += 1;
                stats.count_text(&code.code);
            }
            Block::BlockQuote { blocks } => count_blocks(blocks, stats),
            Block::HorizontalRule => {}
        }
    }
}

fn count_item(item: &ListItem, stats: &mut DocumentStats) {
    stats.list_item_count += 1;
    count_blocks(&item.blocks, stats);
}

fn count_inline(content: &[InlineContent], stats: &mut DocumentStats) {
    for inline in content {
        match inline {
            InlineContent::Text(run) => stats.count_text(&run.text),
            InlineContent::Link { text, .. } => {
                stats.link_count += 1;
                stats.count_text(text);
            }
            InlineContent::LineBreak => {}
        }
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Format the document was parsed from
    pub source_format: Option<Format>,

    /// When the document was parsed
    pub created: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Create metadata for a freshly parsed document.
    pub fn parsed_from(format: Format) -> Self {
        Self {
            title: None,
            source_format: Some(format),
            created: Some(Utc::now()),
        }
    }

    /// Convert metadata to YAML frontmatter format.
    pub fn to_yaml_frontmatter(&self) -> String {
        let mut lines = vec!["---".to_string()];

        if let Some(ref title) = self.title {
            lines.push(format!("title: \"{}\"", escape_yaml(title)));
        }
        if let Some(ref format) = self.source_format {
            lines.push(format!("source_format: {}", format));
        }
        if let Some(ref created) = self.created {
            lines.push(format!("created: {}", created.to_rfc3339()));
        }

        lines.push("---".to_string());
        lines.push(String::new());

        lines.join("\n")
    }
}

/// Escape special characters for YAML strings.
fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Structural statistics of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Number of headings
    pub heading_count: u32,

    /// Number of paragraphs (including those inside list items)
    pub paragraph_count: u32,

    /// Number of lists (including nested lists)
    pub list_count: u32,

    /// Number of list items
    pub list_item_count: u32,

    /// Number of code blocks
    pub code_block_count: u32,

    /// Number of links
    pub link_count: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,
}

impl DocumentStats {
    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }
}
