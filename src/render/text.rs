//! Plain text rendering.

use crate::fill::FillReport;
use crate::model::Document;
use crate::template::ValueMap;
use std::fmt::Write;

/// Convert a document to plain text: one paragraph per line, table rows on
/// their own lines with cells separated by tabs.
pub fn to_text(doc: &Document) -> String {
    doc.plain_text().trim().to_string()
}

/// One `key = value` line per entry, sorted by key.
pub fn values_to_text(values: &ValueMap) -> String {
    let mut output = String::new();
    for (key, value) in values.iter() {
        let _ = writeln!(output, "{} = {}", key, value);
    }
    output
}

/// Short human readable summary of a fill.
pub fn report_summary(report: &FillReport) -> String {
    let mut output = format!(
        "{} placeholders, {} expressions ({} failed) in {}/{} runs",
        report.placeholders,
        report.expressions,
        report.failed_expressions,
        report.runs_changed,
        report.runs_visited
    );
    if report.paragraphs_deleted > 0 {
        let _ = write!(
            output,
            ", {} paragraphs deleted in {} ranges",
            report.paragraphs_deleted, report.ranges_deleted
        );
    }
    if !report.unknown_keys.is_empty() {
        let _ = write!(output, ", unknown keys: {}", report.unknown_keys.join(", "));
    }
    output
}
