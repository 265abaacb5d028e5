//! Block-level types.

use super::{InlineContent, Paragraph, TextRun};
use serde::{Deserialize, Serialize};

/// A content block in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A paragraph of text
    Paragraph(Paragraph),

    /// A heading (level 1-6)
    Heading(Heading),

    /// An ordered or unordered list
    List(List),

    /// A list item on its own. Only valid inside [`List::items`]; a tree
    /// holding one here fails validation.
    ListItem(ListItem),

    /// Preformatted code
    CodeBlock(CodeBlock),

    /// Quoted blocks
    BlockQuote {
        /// Quoted content
        blocks: Vec<Block>,
    },

    /// A horizontal rule / separator
    HorizontalRule,
}

impl Block {
    /// Create a paragraph block with plain text.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph(Paragraph::with_text(text))
    }

    /// Create a heading block with plain text.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading(Heading::new(level, text))
    }

    /// Create a code block.
    pub fn code(language: Option<&str>, code: impl Into<String>) -> Self {
        Block::CodeBlock(CodeBlock {
            language: language.map(str::to_string),
            code: code.into(),
        })
    }

    /// Check if this block is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self, Block::Heading(_))
    }

    /// Check if this block is a list.
    pub fn is_list(&self) -> bool {
        matches!(self, Block::List(_))
    }

    /// Get plain text content of the block.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Paragraph(p) => p.plain_text(),
            Block::Heading(h) => h.plain_text(),
            Block::List(list) => list
                .items
                .iter()
                .map(ListItem::plain_text)
                .collect::<Vec<_>>()
                .join("\n"),
            Block::ListItem(item) => item.plain_text(),
            Block::CodeBlock(code) => code.code.clone(),
            Block::BlockQuote { blocks } => blocks
                .iter()
                .map(Block::plain_text)
                .collect::<Vec<_>>()
                .join("\n\n"),
            Block::HorizontalRule => String::new(),
        }
    }
}

/// A section heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level (1-6)
    pub level: u8,

    /// Heading text
    pub content: Vec<InlineContent>,
}

impl Heading {
    /// Create a heading with plain text. Levels are clamped to 1-6.
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level: level.clamp(1, 6),
            content: vec![InlineContent::Text(TextRun::new(text))],
        }
    }

    /// Get plain text content of the heading.
    pub fn plain_text(&self) -> String {
        super::inline::plain_text(&self.content)
    }
}

/// A list of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    /// Numbered list
    pub ordered: bool,

    /// First number of an ordered list
    pub start: u32,

    /// List items in order
    pub items: Vec<ListItem>,
}

impl List {
    /// Create an empty bulleted list.
    pub fn unordered() -> Self {
        Self {
            ordered: false,
            start: 1,
            items: Vec::new(),
        }
    }

    /// Create an empty numbered list.
    pub fn ordered(start: u32) -> Self {
        Self {
            ordered: true,
            start,
            items: Vec::new(),
        }
    }

    /// Add an item holding a single paragraph of text.
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.items.push(ListItem::with_text(text));
    }

    /// Number of direct items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the list has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A single list item. Nested lists appear as [`Block::List`] inside `blocks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// Item content
    pub blocks: Vec<Block>,
}

impl ListItem {
    /// Create an item holding a single paragraph of text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            blocks: vec![Block::paragraph(text)],
        }
    }

    /// Get plain text content of the item.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Preformatted code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Language tag of a fenced block
    pub language: Option<String>,

    /// Code text, lines separated by `\n`
    pub code: String,
}

impl CodeBlock {
    /// Lines of code, without a trailing empty line.
    pub fn lines(&self) -> Vec<&str> {
        self.code.trim_end_matches('\n').split('\n').collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_clamped() {
        assert_eq!(Heading::new(0, "x").level, 1);
        assert_eq!(Heading::new(9, "x").level, 6);
    }

    #[test]
    fn test_list_plain_text() {
        let mut list = List::unordered();
        list.push_text("a");
        list.push_text("b");
        assert_eq!(list.len(), 2);
        assert_eq!(Block::List(list).plain_text(), "a\nb");
    }

    #[test]
    fn test_code_lines() {
        let code = CodeBlock {
            language: Some("rust".into()),
            code: "fn main() {}\nlet x = 1;\n".into(),
        };
        assert_eq!(code.lines(), vec!["fn main() {}", "let x = 1;"]);
    }

    #[test]
    fn test_block_variants() {
        assert!(Block::heading(2, "Sub").is_heading());
        assert!(Block::List(List::ordered(3)).is_list());
        assert!(!Block::paragraph("p").is_heading());
    }
}
