//! Rendering module for documents, value maps and fill reports.

mod json;
mod text;

pub use json::{to_json, JsonFormat};
pub use text::{report_summary, to_text, values_to_text};
