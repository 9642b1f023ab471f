//! DOCX template loading, filling and saving.
//!
//! Templates are read with `docx-rs` and filled in place: only the text of
//! each run is rewritten, so run properties (font, size, bold, color) are
//! carried through to the output package unchanged.
//!
//! `docx-rs` writes text nodes verbatim and expects them XML-escaped, the
//! way its builders store them. Its reader stores them unescaped, so every
//! loaded template is brought to the escaped form once, and run text is
//! unescaped again whenever it is read.
//!
//! # Example
//!
//! ```no_run
//! use docfill::docx::{DocxTemplate, TemplateSource};
//! use docfill::fill::{fill, FillOptions};
//! use docfill::template::ValueMap;
//!
//! fn main() -> docfill::Result<()> {
//!     let mut template = DocxTemplate::load(&TemplateSource::path("template.docx"))?;
//!     let values = ValueMap::from_pairs(["a", "b"], ["4", "20000"]);
//!     fill(&mut template, &values, &FillOptions::default());
//!     template.save("output.docx")?;
//!     Ok(())
//! }
//! ```

use crate::detect::detect_format_from_bytes;
use crate::error::{Error, Result};
use crate::fill::{CellPosition, RunAction, RunLocation, RunVisitor, TemplateDocument};
use crate::model;
use docx_rs::{
    Delete, DeleteChild, DeleteText, DocumentChild, Docx, FooterChild, HeaderChild, InsertChild,
    Paragraph, ParagraphChild, Run, RunChild, RunProperty, Table, TableCellContent, TableChild,
    TableRowChild, Text,
};
use std::io::Cursor;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Where a template comes from.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// A .docx file on disk
    Path(PathBuf),

    /// An in-memory .docx package
    Bytes(Vec<u8>),
}

impl TemplateSource {
    /// Template read from a file.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        TemplateSource::Path(path.into())
    }

    /// Template held in memory.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        TemplateSource::Bytes(bytes.into())
    }
}

/// A loaded DOCX template.
pub struct DocxTemplate {
    docx: Docx,
}

impl std::fmt::Debug for DocxTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocxTemplate")
            .field("children", &self.docx.document.children.len())
            .finish_non_exhaustive()
    }
}

impl DocxTemplate {
    /// Load a template from its source.
    pub fn load(source: &TemplateSource) -> Result<Self> {
        match source {
            TemplateSource::Path(path) => Self::open(path),
            TemplateSource::Bytes(bytes) => Self::from_bytes(bytes),
        }
    }

    /// Open a .docx file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Parse an in-memory .docx package.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        detect_format_from_bytes(bytes)?;
        let mut docx = docx_rs::read_docx(bytes)?;
        escape_docx(&mut docx);
        Ok(Self { docx })
    }

    /// Wrap a document built with the `docx-rs` builders.
    ///
    /// Builder text is already escaped. Documents from `docx_rs::read_docx`
    /// should go through [`DocxTemplate::from_bytes`] instead.
    pub fn from_docx(docx: Docx) -> Self {
        Self { docx }
    }

    /// Access the underlying `docx-rs` document.
    pub fn docx(&self) -> &Docx {
        &self.docx
    }

    /// Serialize to a .docx package.
    pub fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.docx
            .build()
            .pack(&mut buf)
            .map_err(|e| Error::DocxWrite(e.to_string()))?;
        Ok(buf.into_inner())
    }

    /// Serialize and write to `path`.
    pub fn save<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Append this document's body after the body of `base`.
    ///
    /// Styles and numbering definitions of `base` are kept; the appended
    /// blocks reference styles by id as they did in this template.
    pub fn append_to(self, base: DocxTemplate) -> DocxTemplate {
        let mut base = base;
        base.docx
            .document
            .children
            .extend(self.docx.document.children);
        base
    }

    /// Text-only snapshot of the document as a [`model::Document`].
    pub fn to_document(&self) -> model::Document {
        let mut doc = model::Document::new();
        for child in &self.docx.document.children {
            match child {
                DocumentChild::Paragraph(p) => doc.add_paragraph(paragraph_model(p)),
                DocumentChild::Table(t) => doc.add_table(table_model(t)),
                _ => {}
            }
        }
        doc
    }

    /// Visible text, one line per body block.
    pub fn plain_text(&self) -> String {
        self.to_document().plain_text()
    }

    fn body_paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.docx
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(p) => Some(p.as_ref()),
                _ => None,
            })
    }
}

/// Text of a run: its text children concatenated and unescaped.
fn run_text(run: &Run) -> String {
    let raw: String = run
        .children
        .iter()
        .filter_map(|child| match child {
            RunChild::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect();
    unescape(&raw)
}

/// Reverse of the escaping `Text::new` applies.
fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    const ENTITIES: [(&str, &str); 7] = [
        ("&amp;", "&"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&apos;", "'"),
        ("&#39;", "'"),
        ("&#xA;", "\n"),
    ];

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(index) = rest.find('&') {
        out.push_str(&rest[..index]);
        rest = &rest[index..];
        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, plain)) => {
                out.push_str(plain);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape_docx(docx: &mut Docx) {
    for child in docx.document.children.iter_mut() {
        match child {
            DocumentChild::Paragraph(p) => escape_paragraph(p),
            DocumentChild::Table(t) => escape_table(t),
            _ => {}
        }
    }

    let section = &mut docx.document.section_property;
    for (_, header) in [
        &mut section.header,
        &mut section.first_header,
        &mut section.even_header,
    ]
    .into_iter()
    .flatten()
    {
        for child in header.children.iter_mut() {
            match child {
                HeaderChild::Paragraph(p) => escape_paragraph(p),
                HeaderChild::Table(t) => escape_table(t),
                _ => {}
            }
        }
    }
    for (_, footer) in [
        &mut section.footer,
        &mut section.first_footer,
        &mut section.even_footer,
    ]
    .into_iter()
    .flatten()
    {
        for child in footer.children.iter_mut() {
            match child {
                FooterChild::Paragraph(p) => escape_paragraph(p),
                FooterChild::Table(t) => escape_table(t),
                _ => {}
            }
        }
    }
}

fn escape_paragraph(paragraph: &mut Paragraph) {
    escape_paragraph_children(&mut paragraph.children);
}

fn escape_paragraph_children(children: &mut [ParagraphChild]) {
    for child in children.iter_mut() {
        match child {
            ParagraphChild::Run(run) => escape_run(run),
            ParagraphChild::Insert(insert) => {
                for child in insert.children.iter_mut() {
                    match child {
                        InsertChild::Run(run) => escape_run(run),
                        InsertChild::Delete(delete) => escape_delete(delete),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Delete(delete) => escape_delete(delete),
            ParagraphChild::Hyperlink(link) => escape_paragraph_children(&mut link.children),
            _ => {}
        }
    }
}

fn escape_delete(delete: &mut Delete) {
    for child in delete.children.iter_mut() {
        if let DeleteChild::Run(run) = child {
            escape_run(run);
        }
    }
}

fn escape_run(run: &mut Run) {
    for child in run.children.iter_mut() {
        match child {
            RunChild::Text(t) => *t = Text::new(std::mem::take(&mut t.text)),
            // DeleteText keeps its text private; its serde form exposes it.
            RunChild::DeleteText(t) => {
                let text = serde_json::to_value(&*t)
                    .ok()
                    .and_then(|v| v.get("text").and_then(|s| s.as_str()).map(str::to_string));
                if let Some(text) = text {
                    *t = DeleteText::new(text);
                }
            }
            _ => {}
        }
    }
}

fn escape_table(table: &mut Table) {
    for row in table.rows.iter_mut() {
        let TableChild::TableRow(row) = row;
        for cell in row.cells.iter_mut() {
            let TableRowChild::TableCell(cell) = cell;
            for content in cell.children.iter_mut() {
                match content {
                    TableCellContent::Paragraph(p) => escape_paragraph(p),
                    TableCellContent::Table(t) => escape_table(t),
                    _ => {}
                }
            }
        }
    }
}

/// Put `text` in the run's first text child and drop the other text children.
fn set_run_text(run: &mut Run, text: String) {
    let mut pending = Some(text);
    run.children.retain_mut(|child| match child {
        RunChild::Text(t) => match pending.take() {
            Some(text) => {
                *t = Text::new(text);
                true
            }
            None => false,
        },
        _ => true,
    });
    if let Some(text) = pending {
        run.children.push(RunChild::Text(Text::new(text)));
    }
}

fn runs(paragraph: &Paragraph) -> impl Iterator<Item = &Run> {
    paragraph.children.iter().filter_map(|child| match child {
        ParagraphChild::Run(run) => Some(run.as_ref()),
        _ => None,
    })
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    runs(paragraph).map(run_text).collect()
}

fn paragraph_model(paragraph: &Paragraph) -> model::Paragraph {
    let mut out = model::Paragraph::new();
    for run in runs(paragraph) {
        out.add_run(model::TextRun::new(run_text(run)).styled(style_model(&run.run_property)));
    }
    out.alignment = paragraph
        .property
        .alignment
        .as_ref()
        .map(|j| alignment_model(&j.val))
        .unwrap_or_default();
    out
}

fn alignment_model(val: &str) -> model::Alignment {
    match val {
        "center" => model::Alignment::Center,
        "right" | "end" => model::Alignment::Right,
        "both" | "justified" | "distribute" => model::Alignment::Justify,
        _ => model::Alignment::Left,
    }
}

/// Run properties keep most fields private; their serde form carries
/// `bold`, `italic`, `underline`, `sz` (half-points), `color` and `fonts`.
fn style_model(property: &RunProperty) -> model::TextStyle {
    let Ok(value) = serde_json::to_value(property) else {
        return model::TextStyle::default();
    };
    let flag = |key: &str| value.get(key).and_then(|v| v.as_bool()).unwrap_or(false);

    let fonts = value.get("fonts");
    let font_name = ["eastAsia", "ascii", "hiAnsi", "cs"]
        .iter()
        .find_map(|key| fonts.and_then(|f| f.get(*key)).and_then(|v| v.as_str()))
        .map(str::to_string);

    model::TextStyle {
        bold: flag("bold"),
        italic: flag("italic"),
        underline: value
            .get("underline")
            .and_then(|v| v.as_str())
            .is_some_and(|u| u != "none"),
        font_name,
        font_size: value
            .get("sz")
            .and_then(|v| v.as_f64())
            .map(|half_points| (half_points / 2.0) as f32),
        color: value
            .get("color")
            .and_then(|v| v.as_str())
            .filter(|c| !c.is_empty() && *c != "auto")
            .map(str::to_string),
    }
}

fn table_model(table: &Table) -> model::Table {
    let mut out = model::Table::new();
    for row in &table.rows {
        if let TableChild::TableRow(row) = row {
            let cells = row
                .cells
                .iter()
                .filter_map(|cell| {
                    if let TableRowChild::TableCell(cell) = cell {
                        Some(cell)
                    } else {
                        None
                    }
                })
                .map(|cell| {
                    let mut out = model::TableCell::default();
                    for content in &cell.children {
                        match content {
                            TableCellContent::Paragraph(p) => {
                                out.paragraphs.push(paragraph_model(p))
                            }
                            TableCellContent::Table(t) => out.tables.push(table_model(t)),
                            _ => {}
                        }
                    }
                    out
                })
                .collect();
            out.add_row(model::TableRow::new(cells));
        }
    }
    out
}

fn visit_paragraph(
    paragraph: &mut Paragraph,
    cell: Option<CellPosition>,
    index: usize,
    visitor: &mut dyn RunVisitor,
) {
    let mut run_index = 0;
    for child in paragraph.children.iter_mut() {
        if let ParagraphChild::Run(run) = child {
            let location = RunLocation {
                cell,
                paragraph: index,
                run: run_index,
            };
            let text = run_text(run.as_ref());
            if let RunAction::Replace(resolved) = visitor.visit_run(&location, &text) {
                set_run_text(run.as_mut(), resolved);
            }
            run_index += 1;
        }
    }
}

fn walk_table(table: &mut Table, index: usize, depth: usize, visitor: &mut dyn RunVisitor) {
    for (row_index, row) in table.rows.iter_mut().enumerate() {
        let TableChild::TableRow(row) = row else {
            continue;
        };
        for (cell_index, cell) in row.cells.iter_mut().enumerate() {
            let TableRowChild::TableCell(cell) = cell else {
                continue;
            };
            let position = CellPosition {
                table: index,
                row: row_index,
                cell: cell_index,
                depth,
            };

            let mut p_index = 0;
            for content in cell.children.iter_mut() {
                if let TableCellContent::Paragraph(p) = content {
                    visit_paragraph(p, Some(position), p_index, visitor);
                    p_index += 1;
                }
            }

            let mut t_index = 0;
            for content in cell.children.iter_mut() {
                if let TableCellContent::Table(nested) = content {
                    walk_table(nested, t_index, depth + 1, visitor);
                    t_index += 1;
                }
            }
        }
    }
}

impl TemplateDocument for DocxTemplate {
    fn walk_runs(&mut self, visitor: &mut dyn RunVisitor) {
        let children = &mut self.docx.document.children;

        let mut p_index = 0;
        for child in children.iter_mut() {
            if let DocumentChild::Paragraph(p) = child {
                visit_paragraph(p, None, p_index, visitor);
                p_index += 1;
            }
        }

        let mut t_index = 0;
        for child in children.iter_mut() {
            if let DocumentChild::Table(t) = child {
                walk_table(t, t_index, 0, visitor);
                t_index += 1;
            }
        }
    }

    fn paragraph_texts(&self) -> Vec<String> {
        self.body_paragraphs().map(paragraph_text).collect()
    }

    fn remove_paragraphs(&mut self, range: RangeInclusive<usize>) -> usize {
        let children = &mut self.docx.document.children;
        let before = children.len();
        let mut index = 0;
        children.retain(|child| match child {
            DocumentChild::Paragraph(_) => {
                let keep = !range.contains(&index);
                index += 1;
                keep
            }
            _ => true,
        });
        before - children.len()
    }

    fn clear_paragraphs(&mut self, range: RangeInclusive<usize>) -> usize {
        let mut index = 0;
        let mut cleared = 0;
        for child in self.docx.document.children.iter_mut() {
            if let DocumentChild::Paragraph(p) = child {
                if range.contains(&index) {
                    for run in p.children.iter_mut() {
                        if let ParagraphChild::Run(run) = run {
                            set_run_text(run.as_mut(), String::new());
                        }
                    }
                    cleared += 1;
                }
                index += 1;
            }
        }
        cleared
    }
}
