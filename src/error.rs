//! Error taxonomy for `innodb-dissect`.
//!
//! Every fallible operation in this crate returns `Result<T, DissectError>`.
//! Parsers that merely check "do I have enough bytes" stay `Option`-returning
//! (see e.g. [`crate::innodb::page::FilHeader::parse`]); callers that need a
//! diagnosable failure wrap the `None` into [`DissectError::OutOfBounds`] with
//! a name path describing what was being read.

use thiserror::Error;

/// Errors returned by `innodb-dissect` operations.
#[derive(Error, Debug)]
pub enum DissectError {
    /// A page could not be read from its backing file.
    #[error("cannot read page {page_no}: {reason}")]
    PageRead { page_no: u64, reason: String },

    /// A page was read but its type did not match what the caller expected.
    #[error("page {page_no}: expected {expected}, found {found}")]
    PageTypeMismatch {
        page_no: u64,
        expected: &'static str,
        found: String,
    },

    /// A cursor read ran past the end of its buffer.
    #[error("out of bounds reading {path}: position {position}, buffer length {len}")]
    OutOfBounds {
        position: usize,
        len: usize,
        path: String,
    },

    /// A file or on-disk structure used a format variant this crate does not decode.
    #[error("unsupported format: {what}")]
    UnsupportedFormat { what: String },

    /// A data dictionary column type token has no known decoder.
    #[error("unsupported column type: {token}")]
    UnsupportedType { token: String },

    /// No data dictionary could be located for a tablespace directory.
    #[error("no data dictionary found")]
    DictionaryNotFound,

    /// A named table was not present in the data dictionary.
    #[error("table not found: {name}")]
    MissingTable { name: String },

    /// A named index was not present on a table.
    #[error("index not found: {table}.{index}")]
    MissingIndex { table: String, index: String },

    /// A page's stored checksum did not match its calculated checksum.
    #[error("checksum mismatch on page {page_no}")]
    Checksum { page_no: u64 },

    /// The log reader reached the end of written data.
    #[error("end of log")]
    EndOfLog,

    /// A redo or undo log record used a type code this crate does not decode.
    #[error("unsupported record type: {type_code}")]
    UnsupportedRecordType { type_code: u8 },

    /// Underlying I/O failure (file open, read, seek), with the operation that failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// A structure failed to parse for a reason not covered by a more specific variant.
    #[error("parse error: {0}")]
    Parse(String),

    /// An invalid argument was supplied (out-of-range page number, unknown slot, etc.).
    #[error("invalid argument: {0}")]
    Argument(String),
}

impl From<std::io::Error> for DissectError {
    fn from(e: std::io::Error) -> Self {
        DissectError::Io(e.to_string())
    }
}
