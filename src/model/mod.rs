//! Document model types for template content representation.
//!
//! This module defines an in-memory representation of a Word-style document:
//! body blocks (paragraphs and tables), paragraphs made of styled text runs,
//! and tables whose cells hold paragraphs. The fill pipeline works on this
//! model as well as directly on loaded DOCX packages.

mod document;
mod paragraph;
mod table;

pub use document::{Block, Document};
pub use paragraph::{Alignment, Paragraph, TextRun, TextStyle};
pub use table::{Table, TableCell, TableRow};
