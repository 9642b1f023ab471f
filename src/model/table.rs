//! Table types.

use super::Paragraph;
use serde::{Deserialize, Serialize};

/// A table structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    /// Rows in the table
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A table row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells in the row
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Create a new row with cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self { cells }
    }

    /// Create a row from text values.
    pub fn from_strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(values.into_iter().map(TableCell::text).collect())
    }

    /// Get plain text representation.
    pub fn plain_text(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.plain_text())
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// A table cell holding paragraphs and, occasionally, nested tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell paragraphs
    pub paragraphs: Vec<Paragraph>,

    /// Tables nested inside the cell
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<Table>,
}

impl TableCell {
    /// Create a new cell with text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_content(vec![Paragraph::with_text(text)])
    }

    /// Create a cell with multiple paragraphs.
    pub fn with_content(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            paragraphs,
            tables: Vec::new(),
        }
    }

    /// Get plain text content, nested tables after the paragraphs.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.plain_text())
            .chain(self.tables.iter().map(|t| t.plain_text()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_new() {
        let table = Table::new();
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_table_text() {
        let mut table = Table::new();
        table.add_row(TableRow::from_strings(["Age", "Cash value"]));
        table.add_row(TableRow::from_strings(["56", "{i}"]));

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.plain_text(), "Age\tCash value\n56\t{i}");
    }

    #[test]
    fn test_cell_text() {
        let cell = TableCell::with_content(vec![
            Paragraph::with_text("Hello"),
            Paragraph::with_text("world"),
        ]);
        assert_eq!(cell.plain_text(), "Hello world");
    }
}
