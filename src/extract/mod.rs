//! Value extraction from illustration inputs.
//!
//! Two sources feed a [`ValueMap`](crate::template::ValueMap):
//!
//! - numbers embedded in an illustration's file name (age, premium,
//!   payment term, withdrawal ages and amounts)
//! - cells of the benefit tables in the illustration PDF, located by fixed
//!   page/row/column coordinates or by a keyword in the row
//!
//! Table detection itself happens upstream; this module reads the tables
//! from a [`TableSource`], typically a JSON [`TableDump`].

mod filename;
mod tables;

pub use filename::{digits_only, leading_numbers, numbers_at, numbers_in};
pub use tables::{
    cell_value, keyword_numbers, ColumnRef, Grid, PageRef, PageTables, RowRef, TableDump,
    TableSource,
};
