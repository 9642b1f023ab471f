//! # docfill
//!
//! Placeholder and expression substitution for Word illustration templates.
//!
//! Templates contain `{key}` placeholders and `{{...}}` arithmetic
//! expressions over those placeholders. Filling a template resolves every
//! text run against a [`ValueMap`], formats computed numbers with thousands
//! separators, and optionally removes marker-delimited paragraph ranges.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docfill::{fill_file, FillOptions, ValueMap};
//!
//! fn main() -> docfill::Result<()> {
//!     let values = ValueMap::from_pairs(["a", "b", "c"], ["4", "20000", "5"]);
//!     let report = fill_file("template.docx", "output.docx", &values, &FillOptions::default())?;
//!     println!("{} placeholders resolved", report.placeholders);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Exact placeholders**: `{a}` never matches inside `{ab}`
//! - **Safe expressions**: `+ - * / ( )` over numbers only, "N/A" on any failure
//! - **Formatting preserved**: only run text changes, run properties stay
//! - **Range deletion**: drop template sections between two marker paragraphs
//! - **Products**: value collection from illustration file names and tables

pub mod detect;
pub mod docx;
pub mod error;
pub mod extract;
pub mod fill;
pub mod model;
pub mod product;
pub mod render;
pub mod template;

// Re-export commonly used types
pub use detect::{
    detect_format_from_bytes, detect_format_from_path, detect_format_from_reader, is_docx_bytes,
    TemplateFormat,
};
pub use docx::{DocxTemplate, TemplateSource};
pub use error::{Error, Result};
pub use fill::{fill, DeletionRange, DeletionStrategy, FillOptions, FillReport, TemplateDocument};
pub use model::{Block, Document, Paragraph, Table, TableCell, TableRow, TextRun};
pub use product::{Generator, Illustration, InputRole, ProductProfile, ProductRegistry};
pub use render::JsonFormat;
pub use template::{
    evaluate_expression, format_number, resolve_placeholders, resolve_run_text, MissingValue,
    Resolver, ValueMap, NOT_AVAILABLE,
};

use std::path::Path;

/// Fill a template file and write the result.
///
/// # Arguments
///
/// * `template` - Path to the .docx template
/// * `output` - Path of the filled document
/// * `values` - Values for the template's placeholders
/// * `options` - Missing-value policy and deletion ranges
///
/// # Example
///
/// ```no_run
/// use docfill::{fill_file, DeletionRange, FillOptions, ValueMap};
///
/// let values = ValueMap::from_json(r#"{"a": "4", "b": "20000"}"#).unwrap();
/// let options = FillOptions::new().with_deletion(DeletionRange::new("START", "END"));
/// fill_file("template.docx", "output.docx", &values, &options).unwrap();
/// ```
pub fn fill_file<P: AsRef<Path>, Q: AsRef<Path>>(
    template: P,
    output: Q,
    values: &ValueMap,
    options: &FillOptions,
) -> Result<FillReport> {
    let DocfillResult { document, report } = Docfill::new()
        .with_options(options.clone())
        .fill(&TemplateSource::path(template.as_ref()), values)?;
    document.save(output)?;
    Ok(report)
}

/// Fill an in-memory template and return the filled package.
///
/// # Example
///
/// ```no_run
/// use docfill::{fill_bytes, FillOptions, ValueMap};
///
/// let template = std::fs::read("template.docx").unwrap();
/// let values = ValueMap::from_pairs(["a"], ["4"]);
/// let (bytes, report) = fill_bytes(&template, &values, &FillOptions::default()).unwrap();
/// std::fs::write("output.docx", bytes).unwrap();
/// ```
pub fn fill_bytes(
    template: &[u8],
    values: &ValueMap,
    options: &FillOptions,
) -> Result<(Vec<u8>, FillReport)> {
    let mut document = DocxTemplate::from_bytes(template)?;
    let report = fill(&mut document, values, options);
    Ok((document.to_bytes()?, report))
}

/// Extract the visible text of a .docx file.
///
/// # Example
///
/// ```no_run
/// use docfill::extract_text;
///
/// let text = extract_text("output.docx").unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let document = DocxTemplate::open(path)?;
    Ok(render::to_text(&document.to_document()))
}

/// Builder for filling templates.
///
/// # Example
///
/// ```no_run
/// use docfill::{Docfill, MissingValue, TemplateSource, ValueMap};
///
/// let values = ValueMap::from_pairs(["a"], ["4"]);
/// Docfill::new()
///     .with_missing(MissingValue::Zero)
///     .with_deletion("在人生的重要阶段提取：", "不提取分红，在某年，把累积的本金")
///     .fill(&TemplateSource::path("template.docx"), &values)?
///     .save("output.docx")?;
/// # Ok::<(), docfill::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Docfill {
    options: FillOptions,
}

impl Docfill {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all fill options.
    pub fn with_options(mut self, options: FillOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the substitution for keys missing inside expressions.
    pub fn with_missing(mut self, missing: MissingValue) -> Self {
        self.options = self.options.with_missing(missing);
        self
    }

    /// Remove the paragraphs between two markers after filling.
    pub fn with_deletion(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.options = self.options.with_deletion(DeletionRange::new(start, end));
        self
    }

    /// Clear deleted paragraphs instead of removing them.
    pub fn clear_deleted(mut self) -> Self {
        self.options = self.options.with_strategy(DeletionStrategy::ClearText);
        self
    }

    /// The options the builder will fill with.
    pub fn options(&self) -> &FillOptions {
        &self.options
    }

    /// Load and fill a template.
    pub fn fill(&self, source: &TemplateSource, values: &ValueMap) -> Result<DocfillResult> {
        let mut document = DocxTemplate::load(source)?;
        let report = fill(&mut document, values, &self.options);
        Ok(DocfillResult { document, report })
    }
}

/// A filled template and what filling it did.
#[derive(Debug)]
pub struct DocfillResult {
    /// The filled document
    pub document: DocxTemplate,
    /// Counts of what was resolved and deleted
    pub report: FillReport,
}

impl DocfillResult {
    /// Visible text of the filled document.
    pub fn plain_text(&self) -> String {
        self.document.plain_text()
    }

    /// Report as JSON.
    pub fn report_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.report, format)
    }

    /// Serialize the filled document.
    pub fn to_bytes(self) -> Result<Vec<u8>> {
        self.document.to_bytes()
    }

    /// Write the filled document to `path`.
    pub fn save<P: AsRef<Path>>(self, path: P) -> Result<()> {
        self.document.save(path)
    }
}
