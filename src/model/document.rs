//! Document-level types.

use super::{Paragraph, Table};
use serde::{Deserialize, Serialize};

/// A document: an ordered sequence of body blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Body blocks in document order
    pub blocks: Vec<Block>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Create a document with one single-run paragraph per line.
    pub fn from_lines<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            blocks: lines
                .into_iter()
                .map(|line| Block::Paragraph(Paragraph::with_text(line)))
                .collect(),
        }
    }

    /// Add a block to the document.
    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Add a paragraph to the document body.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    /// Add a table to the document body.
    pub fn add_table(&mut self, table: Table) {
        self.blocks.push(Block::Table(table));
    }

    /// Top-level body paragraphs in document order (tables excluded).
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }

    /// Top-level tables in document order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
    }

    /// Number of top-level body paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    /// Check if the document has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|block| block.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A body-level block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A paragraph
    Paragraph(Paragraph),

    /// A table
    Table(Table),
}

impl Block {
    /// Get plain text content of the block.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Paragraph(p) => p.plain_text(),
            Block::Table(t) => t.plain_text(),
        }
    }
}
