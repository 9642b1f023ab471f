//! Run visiting over template documents.
//!
//! A [`TemplateDocument`] exposes its text runs to a [`RunVisitor`] in a
//! fixed order: body paragraphs first, then every table's rows and cells.
//! Visitors only ever see and rewrite run text; run formatting stays with
//! the document.

use crate::model::{Block, Document, Paragraph, Table};
use crate::template::Resolver;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use super::FillReport;

/// Position of a table cell in the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPosition {
    /// Table index within its container (the body, or the enclosing cell)
    pub table: usize,
    /// Row index
    pub row: usize,
    /// Cell index within the row
    pub cell: usize,
    /// Nesting depth (0 = top-level table)
    pub depth: usize,
}

/// Where a visited run lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLocation {
    /// Enclosing cell, or `None` for body paragraphs
    pub cell: Option<CellPosition>,
    /// Paragraph index within the body or the cell
    pub paragraph: usize,
    /// Run index within the paragraph
    pub run: usize,
}

impl RunLocation {
    /// Location of a run in a body paragraph.
    pub fn body(paragraph: usize, run: usize) -> Self {
        Self {
            cell: None,
            paragraph,
            run,
        }
    }
}

/// Action returned by a visitor for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RunAction {
    /// Leave the run text as it is.
    #[default]
    Keep,

    /// Replace the run text.
    Replace(String),
}

impl RunAction {
    /// Get replacement text if available.
    pub fn replacement(&self) -> Option<&str> {
        match self {
            RunAction::Replace(s) => Some(s),
            RunAction::Keep => None,
        }
    }
}

/// Trait for visiting the text runs of a document.
pub trait RunVisitor {
    /// Called once per run, in traversal order.
    fn visit_run(&mut self, location: &RunLocation, text: &str) -> RunAction;
}

/// A document whose runs can be rewritten and whose body paragraphs can be removed.
pub trait TemplateDocument {
    /// Visit every run exactly once: body paragraphs in order, then each
    /// table row by row and cell by cell (cell paragraphs, then tables
    /// nested in the cell).
    fn walk_runs(&mut self, visitor: &mut dyn RunVisitor);

    /// Text of each top-level body paragraph, in order.
    fn paragraph_texts(&self) -> Vec<String>;

    /// Detach the body paragraphs in `range`; returns how many were removed.
    fn remove_paragraphs(&mut self, range: RangeInclusive<usize>) -> usize;

    /// Empty every run of the body paragraphs in `range` while keeping the
    /// paragraphs themselves; returns how many paragraphs were cleared.
    fn clear_paragraphs(&mut self, range: RangeInclusive<usize>) -> usize;
}

/// Visitor that resolves placeholders and expressions in each run.
pub struct ResolveVisitor<'a> {
    resolver: Resolver<'a>,
    report: FillReport,
    unknown: BTreeSet<String>,
}

impl<'a> ResolveVisitor<'a> {
    /// Create a visitor around a resolver.
    pub fn new(resolver: Resolver<'a>) -> Self {
        Self {
            resolver,
            report: FillReport::default(),
            unknown: BTreeSet::new(),
        }
    }

    /// Finish visiting and return the counts collected so far.
    pub fn into_report(mut self) -> FillReport {
        self.report.unknown_keys = self.unknown.into_iter().collect();
        self.report
    }
}

impl RunVisitor for ResolveVisitor<'_> {
    fn visit_run(&mut self, location: &RunLocation, text: &str) -> RunAction {
        self.report.runs_visited += 1;

        let resolution = self.resolver.resolve(text);
        self.report.placeholders += resolution.placeholders;
        self.report.expressions += resolution.expressions;
        self.report.failed_expressions += resolution.failed_expressions;
        for key in resolution.unknown_keys {
            if self.unknown.insert(key.clone()) {
                log::warn!("No value for placeholder {{{}}} (first seen at {:?})", key, location);
            }
        }

        if resolution.text == text {
            RunAction::Keep
        } else {
            self.report.runs_changed += 1;
            RunAction::Replace(resolution.text)
        }
    }
}

fn visit_paragraph(
    paragraph: &mut Paragraph,
    cell: Option<CellPosition>,
    index: usize,
    visitor: &mut dyn RunVisitor,
) {
    for (run_index, run) in paragraph.runs.iter_mut().enumerate() {
        let location = RunLocation {
            cell,
            paragraph: index,
            run: run_index,
        };
        if let RunAction::Replace(text) = visitor.visit_run(&location, &run.text) {
            run.text = text;
        }
    }
}

fn walk_table(table: &mut Table, index: usize, depth: usize, visitor: &mut dyn RunVisitor) {
    for (row_index, row) in table.rows.iter_mut().enumerate() {
        for (cell_index, cell) in row.cells.iter_mut().enumerate() {
            let position = CellPosition {
                table: index,
                row: row_index,
                cell: cell_index,
                depth,
            };
            for (p_index, paragraph) in cell.paragraphs.iter_mut().enumerate() {
                visit_paragraph(paragraph, Some(position), p_index, visitor);
            }
            for (t_index, nested) in cell.tables.iter_mut().enumerate() {
                walk_table(nested, t_index, depth + 1, visitor);
            }
        }
    }
}

impl TemplateDocument for Document {
    fn walk_runs(&mut self, visitor: &mut dyn RunVisitor) {
        let paragraphs = self.blocks.iter_mut().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        });
        for (index, paragraph) in paragraphs.enumerate() {
            visit_paragraph(paragraph, None, index, visitor);
        }

        let tables = self.blocks.iter_mut().filter_map(|block| match block {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        });
        for (index, table) in tables.enumerate() {
            walk_table(table, index, 0, visitor);
        }
    }

    fn paragraph_texts(&self) -> Vec<String> {
        self.paragraphs().map(Paragraph::plain_text).collect()
    }

    fn remove_paragraphs(&mut self, range: RangeInclusive<usize>) -> usize {
        let before = self.blocks.len();
        let mut index = 0;
        self.blocks.retain(|block| match block {
            Block::Paragraph(_) => {
                let keep = !range.contains(&index);
                index += 1;
                keep
            }
            Block::Table(_) => true,
        });
        before - self.blocks.len()
    }

    fn clear_paragraphs(&mut self, range: RangeInclusive<usize>) -> usize {
        let paragraphs = self.blocks.iter_mut().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        });
        let mut cleared = 0;
        for (index, paragraph) in paragraphs.enumerate() {
            if range.contains(&index) {
                paragraph.runs.iter_mut().for_each(|run| run.text.clear());
                cleared += 1;
            }
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TableCell, TableRow};

    /// Records every location it is shown.
    struct Recorder(Vec<(RunLocation, String)>);

    impl RunVisitor for Recorder {
        fn visit_run(&mut self, location: &RunLocation, text: &str) -> RunAction {
            self.0.push((*location, text.to_string()));
            RunAction::Keep
        }
    }

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_runs(["p0r0", "p0r1"]));

        let mut inner = Table::new();
        inner.add_row(TableRow::from_strings(["nested"]));
        let mut cell = TableCell::text("cell");
        cell.tables.push(inner);

        let mut table = Table::new();
        table.add_row(TableRow::new(vec![cell, TableCell::text("c01")]));
        doc.add_table(table);
        doc.add_paragraph(Paragraph::with_text("p1"));
        doc
    }

    #[test]
    fn test_traversal_order() {
        let mut doc = sample();
        let mut recorder = Recorder(Vec::new());
        doc.walk_runs(&mut recorder);

        let texts: Vec<&str> = recorder.0.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(texts, vec!["p0r0", "p0r1", "p1", "cell", "nested", "c01"]);

        assert_eq!(recorder.0[2].0, RunLocation::body(1, 0));
        let nested = recorder.0[4].0.cell.unwrap();
        assert_eq!(nested.depth, 1);
        assert_eq!(recorder.0[5].0.cell.unwrap().cell, 1);
    }

    #[test]
    fn test_remove_paragraphs_keeps_tables() {
        let mut doc = sample();
        assert_eq!(doc.remove_paragraphs(0..=1), 2);
        assert_eq!(doc.paragraph_count(), 0);
        assert_eq!(doc.tables().count(), 1);
    }

    #[test]
    fn test_clear_paragraphs_keeps_count() {
        let mut doc = sample();
        assert_eq!(doc.clear_paragraphs(0..=0), 1);
        assert_eq!(doc.paragraph_texts(), vec!["", "p1"]);
        assert_eq!(doc.paragraph_count(), 2);
    }
}
