//! Error types for docfill library.

use std::io;
use thiserror::Error;

/// Result type alias for docfill operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading inputs and writing documents.
///
/// Placeholder and expression resolution never produce these: a value that
/// cannot be resolved is written into the document as "N/A" instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The template is not recognized as a DOCX package.
    #[error("Unknown file format: not a valid DOCX package")]
    UnknownFormat,

    /// The DOCX package could not be read.
    #[error("DOCX read error: {0}")]
    DocxRead(String),

    /// The DOCX package could not be written.
    #[error("DOCX write error: {0}")]
    DocxWrite(String),

    /// JSON input (values, table dumps, profiles) could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value key is not a non-empty ASCII alphanumeric string.
    #[error("Invalid value key: {0:?}")]
    InvalidKey(String),

    /// A filename did not contain enough numbers for the product.
    #[error("File name {name:?} has {found} numbers, expected at least {expected}")]
    FilenameValues {
        /// File name that was inspected
        name: String,
        /// Minimum count of numbers required
        expected: usize,
        /// Count actually found
        found: usize,
    },

    /// A required input document was not supplied.
    #[error("Missing required input: {0}")]
    MissingInput(String),

    /// No product profile with this name.
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    /// A product profile is inconsistent.
    #[error("Invalid product profile: {0}")]
    InvalidProfile(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<docx_rs::ReaderError> for Error {
    fn from(err: docx_rs::ReaderError) -> Self {
        Error::DocxRead(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownFormat;
        assert_eq!(err.to_string(), "Unknown file format: not a valid DOCX package");

        let err = Error::FilenameValues {
            name: "4岁_存5年.pdf".to_string(),
            expected: 6,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "File name \"4岁_存5年.pdf\" has 2 numbers, expected at least 6"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
