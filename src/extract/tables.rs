//! Cell lookup over the benefit tables of an illustration.

use crate::error::Result;
use crate::template::NOT_AVAILABLE;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// One detected table: rows of cell text.
pub type Grid = Vec<Vec<String>>;

/// Tables detected on the pages of one illustration.
pub trait TableSource {
    /// Display name of the source (usually the PDF file name).
    fn name(&self) -> Option<&str>;

    /// Total number of pages in the illustration.
    fn page_count(&self) -> usize;

    /// Tables on a 1-based page, in detection order.
    fn tables(&self, page: usize) -> &[Grid];
}

/// Tables of one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageTables {
    /// 1-based page number
    pub number: usize,

    /// Tables on the page
    #[serde(default)]
    pub tables: Vec<Grid>,
}

/// JSON dump of the tables detected in an illustration PDF.
///
/// ```json
/// {
///   "source_name": "4岁人士存20000美金存5年_19到85岁提取12000.pdf",
///   "page_count": 12,
///   "pages": [{ "number": 6, "tables": [[["ANB", "Total"], ["56", "240,547"]]] }]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableDump {
    /// Name of the PDF the tables were taken from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,

    /// Page count of the PDF, including pages without tables
    pub page_count: usize,

    /// Pages that have tables
    #[serde(default)]
    pub pages: Vec<PageTables>,
}

impl TableDump {
    /// Create an empty dump for a document of `page_count` pages.
    pub fn new(page_count: usize) -> Self {
        Self {
            source_name: None,
            page_count,
            pages: Vec::new(),
        }
    }

    /// Parse a dump from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a dump from a JSON file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Set the source name.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Append a table to a page, creating the page entry if needed.
    pub fn add_table(&mut self, page: usize, table: Grid) {
        match self.pages.iter_mut().find(|p| p.number == page) {
            Some(p) => p.tables.push(table),
            None => self.pages.push(PageTables {
                number: page,
                tables: vec![table],
            }),
        }
    }
}

impl TableSource for TableDump {
    fn name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    fn page_count(&self) -> usize {
        self.page_count
    }

    fn tables(&self, page: usize) -> &[Grid] {
        self.pages
            .iter()
            .find(|p| p.number == page)
            .map(|p| p.tables.as_slice())
            .unwrap_or(&[])
    }
}

/// Which page to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageRef {
    /// A 1-based page number
    Index(usize),

    /// `page_count - n`, for tables whose position is fixed relative to the
    /// end of the illustration
    FromEnd(usize),
}

impl PageRef {
    /// Resolve to a 1-based page number.
    pub fn resolve(self, page_count: usize) -> Option<usize> {
        let page = match self {
            PageRef::Index(n) => n,
            PageRef::FromEnd(n) => page_count.checked_sub(n)?,
        };
        (page >= 1 && page <= page_count).then_some(page)
    }
}

/// Which row of a table to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowRef {
    /// 0-based row from the top
    Index(usize),

    /// `row_count - n`; `FromBottom(1)` is the last row
    FromBottom(usize),
}

impl RowRef {
    /// Resolve against a table with `rows` rows.
    pub fn resolve(self, rows: usize) -> Option<usize> {
        let row = match self {
            RowRef::Index(n) => n,
            RowRef::FromBottom(n) => rows.checked_sub(n)?,
        };
        (row < rows).then_some(row)
    }
}

/// Which column of a row to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRef {
    /// 0-based column from the left
    Index(usize),

    /// `cell_count - n`; `FromEnd(1)` is the last cell
    FromEnd(usize),
}

impl ColumnRef {
    /// Resolve against a row with `cells` cells.
    pub fn resolve(self, cells: usize) -> Option<usize> {
        let column = match self {
            ColumnRef::Index(n) => n,
            ColumnRef::FromEnd(n) => cells.checked_sub(n)?,
        };
        (column < cells).then_some(column)
    }
}

fn clean_cell(text: &str) -> String {
    text.chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect()
}

fn lookup(table: &Grid, row: RowRef, column: ColumnRef) -> Option<&str> {
    let cells = table.get(row.resolve(table.len())?)?;
    cells.get(column.resolve(cells.len())?).map(String::as_str)
}

/// Text of one cell with thousands separators and whitespace removed.
///
/// Each table on the page is tried in order and the first one that has the
/// coordinate wins. Returns "N/A" when no table has it.
pub fn cell_value<S: TableSource + ?Sized>(
    source: &S,
    page: PageRef,
    row: RowRef,
    column: ColumnRef,
) -> String {
    let found = page
        .resolve(source.page_count())
        .and_then(|page| {
            source
                .tables(page)
                .iter()
                .find_map(|table| lookup(table, row, column))
        })
        .map(clean_cell);

    match found {
        Some(value) => value,
        None => {
            log::warn!(
                "No cell at {:?}/{:?}/{:?} in {}",
                page,
                row,
                column,
                source.name().unwrap_or("<tables>")
            );
            NOT_AVAILABLE.to_string()
        }
    }
}

fn numeric_tokens() -> &'static Regex {
    static TOKENS: OnceLock<Regex> = OnceLock::new();
    TOKENS.get_or_init(|| Regex::new(r"[0-9,.]+").unwrap())
}

/// Numbers in the first row mentioning `keyword`.
///
/// Rows are scanned top-down, table by table. Cells containing the keyword
/// itself are skipped so plan codes like `CIP2` don't contribute digits.
/// Returns an empty list if no row matches.
pub fn keyword_numbers<S: TableSource + ?Sized>(
    source: &S,
    page: PageRef,
    keyword: &str,
) -> Vec<String> {
    let Some(page) = page.resolve(source.page_count()) else {
        return Vec::new();
    };

    let row = source
        .tables(page)
        .iter()
        .flat_map(|table| table.iter())
        .find(|row| row.iter().any(|cell| cell.contains(keyword)));

    let Some(row) = row else {
        log::debug!("Keyword {:?} not found on page {}", keyword, page);
        return Vec::new();
    };

    row.iter()
        .filter(|cell| !cell.contains(keyword))
        .flat_map(|cell| numeric_tokens().find_iter(cell))
        .map(|m| m.as_str())
        .filter(|token| token.bytes().any(|b| b.is_ascii_digit()))
        .map(|token| token.replace(',', ""))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn sample() -> TableDump {
        let mut dump = TableDump::new(12).with_source_name("sample.pdf");
        dump.add_table(
            3,
            grid(&[
                &["Plan", "Term", "Premium", "Sum"],
                &["CIP2 Critical", "20", "1,234.5", "100,000"],
            ]),
        );
        dump.add_table(6, grid(&[&["a", "b"], &["c", "d"]]));
        dump.add_table(
            6,
            grid(&[
                &["ANB", "Cash", "Total", ""],
                &["56", "1", "240,547", ""],
                &["66", "2", "454,690", ""],
            ]),
        );
        dump
    }

    #[test]
    fn test_page_ref() {
        assert_eq!(PageRef::Index(3).resolve(12), Some(3));
        assert_eq!(PageRef::FromEnd(6).resolve(12), Some(6));
        assert_eq!(PageRef::FromEnd(12).resolve(12), None);
        assert_eq!(PageRef::Index(13).resolve(12), None);
        assert_eq!(PageRef::Index(0).resolve(12), None);
    }

    #[test]
    fn test_row_and_column_refs() {
        assert_eq!(RowRef::FromBottom(1).resolve(5), Some(4));
        assert_eq!(RowRef::FromBottom(6).resolve(5), None);
        assert_eq!(RowRef::Index(5).resolve(5), None);
        assert_eq!(ColumnRef::FromEnd(2).resolve(4), Some(2));
        assert_eq!(ColumnRef::FromEnd(0).resolve(4), None);
    }

    #[test]
    fn test_cell_value_falls_through_tables() {
        let dump = sample();
        // The first table on page 6 has no row 2, the second does.
        assert_eq!(
            cell_value(&dump, PageRef::FromEnd(6), RowRef::Index(2), ColumnRef::Index(2)),
            "454690"
        );
        assert_eq!(
            cell_value(&dump, PageRef::Index(6), RowRef::Index(0), ColumnRef::Index(0)),
            "a"
        );
    }

    #[test]
    fn test_cell_value_from_bottom() {
        let dump = sample();
        assert_eq!(
            cell_value(
                &dump,
                PageRef::Index(6),
                RowRef::FromBottom(2),
                ColumnRef::FromEnd(2)
            ),
            "240547"
        );
    }

    #[test]
    fn test_cell_value_missing() {
        let dump = sample();
        assert_eq!(
            cell_value(&dump, PageRef::Index(4), RowRef::Index(0), ColumnRef::Index(0)),
            NOT_AVAILABLE
        );
        assert_eq!(
            cell_value(&dump, PageRef::Index(3), RowRef::Index(0), ColumnRef::Index(9)),
            NOT_AVAILABLE
        );
    }

    #[test]
    fn test_keyword_numbers() {
        let dump = sample();
        assert_eq!(
            keyword_numbers(&dump, PageRef::Index(3), "CIP2"),
            vec!["20", "1234.5", "100000"]
        );
        assert!(keyword_numbers(&dump, PageRef::Index(3), "CIM3").is_empty());
        assert!(keyword_numbers(&dump, PageRef::Index(40), "CIP2").is_empty());
    }

    #[test]
    fn test_dump_from_json() {
        let json = r#"{
            "page_count": 4,
            "pages": [{ "number": 2, "tables": [[["x", "1,000"]]] }]
        }"#;
        let dump = TableDump::from_json(json).unwrap();
        assert_eq!(dump.name(), None);
        assert_eq!(dump.tables(2).len(), 1);
        assert!(dump.tables(1).is_empty());
        assert_eq!(
            cell_value(&dump, PageRef::Index(2), RowRef::Index(0), ColumnRef::FromEnd(1)),
            "1000"
        );
    }
}
