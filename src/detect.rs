//! Template format detection and validation.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Template package formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFormat {
    /// Office Open XML word processing package (.docx)
    Docx,
}

impl std::fmt::Display for TemplateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateFormat::Docx => write!(f, "DOCX"),
        }
    }
}

/// Zip local file header signature: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// OLE compound file signature used by legacy .doc files
const OLE_MAGIC: &[u8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Detect the template format from a file path.
///
/// # Example
/// ```no_run
/// use docfill::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("template.docx").unwrap();
/// println!("Format: {}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<TemplateFormat> {
    let file = File::open(path)?;
    detect_format_from_reader(BufReader::new(file))
}

/// Detect the template format from the first bytes of a reader.
///
/// Reads until eight bytes are in or the reader is exhausted.
pub fn detect_format_from_reader<R: Read>(reader: R) -> Result<TemplateFormat> {
    let mut header = Vec::with_capacity(8);
    reader.take(8).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect the template format from the leading bytes of a file.
///
/// # Returns
/// * `Ok(TemplateFormat::Docx)` if the data starts with a zip header
/// * `Err(Error::UnknownFormat)` otherwise
pub fn detect_format_from_bytes(data: &[u8]) -> Result<TemplateFormat> {
    if data.starts_with(ZIP_MAGIC) {
        return Ok(TemplateFormat::Docx);
    }
    if data.starts_with(OLE_MAGIC) {
        log::warn!("Legacy .doc templates are not supported; save the template as .docx");
    }
    Err(Error::UnknownFormat)
}

/// Check if bytes look like a DOCX package.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}
