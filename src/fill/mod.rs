//! Template filling: run resolution over a whole document, then range deletion.
//!
//! # Example
//!
//! ```
//! use docfill::fill::{fill, DeletionRange, FillOptions, TemplateDocument};
//! use docfill::model::Document;
//! use docfill::template::ValueMap;
//!
//! let mut doc = Document::from_lines([
//!     "Premium {b} per year",
//!     "STAGED withdrawals",
//!     "END of staged section",
//!     "Total {{{b}*{c}}}",
//! ]);
//! let values = ValueMap::from_pairs(["b", "c"], ["20000", "5"]);
//! let options = FillOptions::new().with_deletion(DeletionRange::new("STAGED", "END"));
//!
//! let report = fill(&mut doc, &values, &options);
//! assert_eq!(doc.paragraph_texts(), vec!["Premium 20000 per year", "Total 100,000"]);
//! assert_eq!(report.paragraphs_deleted, 2);
//! ```

mod delete;
mod visitor;

pub use delete::{delete_range, find_range, DeletionRange, DeletionStrategy};
pub use visitor::{
    CellPosition, ResolveVisitor, RunAction, RunLocation, RunVisitor, TemplateDocument,
};

use crate::template::{MissingValue, Resolver, ValueMap};
use serde::{Deserialize, Serialize};

/// Options for filling a template.
#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    /// Substitution for keys absent from the value map inside expressions
    pub missing: MissingValue,

    /// Marker pairs to delete, applied in order after resolution
    pub deletions: Vec<DeletionRange>,

    /// How deleted ranges are removed
    pub strategy: DeletionStrategy,
}

impl FillOptions {
    /// Create new fill options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the missing-value policy.
    pub fn with_missing(mut self, missing: MissingValue) -> Self {
        self.missing = missing;
        self
    }

    /// Add a marker pair to delete.
    pub fn with_deletion(mut self, range: DeletionRange) -> Self {
        self.deletions.push(range);
        self
    }

    /// Add several marker pairs to delete.
    pub fn with_deletions(mut self, ranges: impl IntoIterator<Item = DeletionRange>) -> Self {
        self.deletions.extend(ranges);
        self
    }

    /// Set the deletion strategy.
    pub fn with_strategy(mut self, strategy: DeletionStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Summary of one fill pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillReport {
    /// Runs visited
    pub runs_visited: usize,

    /// Runs whose text changed
    pub runs_changed: usize,

    /// Placeholders replaced with a value
    pub placeholders: usize,

    /// Expressions evaluated
    pub expressions: usize,

    /// Expressions that resolved to "N/A"
    pub failed_expressions: usize,

    /// Placeholder keys without a value, sorted
    pub unknown_keys: Vec<String>,

    /// Marker pairs that matched
    pub ranges_deleted: usize,

    /// Paragraphs removed or cleared
    pub paragraphs_deleted: usize,
}

impl FillReport {
    /// Check whether everything in the template resolved.
    pub fn is_complete(&self) -> bool {
        self.failed_expressions == 0 && self.unknown_keys.is_empty()
    }
}

/// Resolve every run of `doc` against `values`, then apply the deletions.
///
/// Never fails: unresolvable values show up as "N/A" in the document and
/// in the returned report.
pub fn fill<D: TemplateDocument + ?Sized>(
    doc: &mut D,
    values: &ValueMap,
    options: &FillOptions,
) -> FillReport {
    let resolver = Resolver::new(values).with_missing(options.missing);
    let mut visitor = ResolveVisitor::new(resolver);
    doc.walk_runs(&mut visitor);
    let mut report = visitor.into_report();

    for range in &options.deletions {
        let deleted = delete_range(&mut *doc, range, options.strategy);
        if deleted > 0 {
            report.ranges_deleted += 1;
            report.paragraphs_deleted += deleted;
        }
    }

    log::debug!(
        "Filled {} runs ({} changed), {} placeholders, {} expressions",
        report.runs_visited,
        report.runs_changed,
        report.placeholders,
        report.expressions
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Document, Paragraph, Table, TableRow};

    #[test]
    fn test_fill_body_and_tables() {
        let mut doc = Document::from_lines(["Age {a}"]);
        let mut table = Table::new();
        table.add_row(TableRow::from_strings(["{g}", "{{{g}*2}}"]));
        doc.add_table(table);

        let values = ValueMap::from_pairs(["a", "g"], ["4", "1500"]);
        let report = fill(&mut doc, &values, &FillOptions::new());

        assert_eq!(doc.plain_text(), "Age 4\n1500\t3,000");
        assert_eq!(report.runs_visited, 3);
        assert_eq!(report.runs_changed, 3);
        assert_eq!(report.placeholders, 3);
        assert_eq!(report.expressions, 1);
        assert!(report.is_complete());
    }

    #[test]
    fn test_report_unknown_keys() {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_runs(["{x}", "{x} {y}", "{{{x}+1}}"]));

        let report = fill(&mut doc, &ValueMap::new(), &FillOptions::new());
        assert_eq!(report.unknown_keys, vec!["x", "y"]);
        assert_eq!(report.failed_expressions, 1);
        assert_eq!(report.runs_changed, 1);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_deletions_apply_in_order() {
        let mut doc = Document::from_lines(["keep", "A1", "A2", "B1", "B2", "tail"]);
        let options = FillOptions::new()
            .with_deletions([DeletionRange::new("A1", "A2"), DeletionRange::new("B1", "B2")])
            .with_strategy(DeletionStrategy::Remove);

        let report = fill(&mut doc, &ValueMap::new(), &options);
        assert_eq!(doc.paragraph_texts(), vec!["keep", "tail"]);
        assert_eq!(report.ranges_deleted, 2);
        assert_eq!(report.paragraphs_deleted, 4);
    }

    #[test]
    fn test_markers_match_resolved_text() {
        let mut doc = Document::from_lines(["x", "section {k}", "end", "y"]);
        let values = ValueMap::from_pairs(["k"], ["STAGED"]);
        let options = FillOptions::new().with_deletion(DeletionRange::new("section STAGED", "end"));

        fill(&mut doc, &values, &options);
        assert_eq!(doc.paragraph_texts(), vec!["x", "y"]);
    }
}
