//! Document model types.
//!
//! This module defines the intermediate representation (IR) that bridges
//! parsing and rendering. Every parser produces a [`Document`] and every
//! renderer consumes one, so adding a format means one new parser and/or
//! one new renderer rather than a converter per format pair.

mod block;
mod document;
mod inline;

pub use block::{Block, CodeBlock, Heading, List, ListItem};
pub use document::{Document, DocumentStats, Metadata};
pub use inline::{plain_text, InlineContent, Paragraph, TextRun, TextStyle};
