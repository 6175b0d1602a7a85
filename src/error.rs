//! Error taxonomy for the pipeline stages.
//!
//! Only [`ExportError`] ends an invocation; the others are turned into
//! [`crate::Notice`]s by the pipeline and processing continues.

use crate::error_display::{user_message_from_calamine, user_message_from_polars};
use polars::prelude::PolarsError;
use std::fmt;
use thiserror::Error;

/// A source file could not be read as a pipe-delimited table.
#[derive(Debug, Error)]
#[error("{source_name}: {}", user_message_from_polars(.error))]
pub struct ParseError {
    pub source_name: String,
    #[source]
    pub error: PolarsError,
}

/// The configured field separator cannot be used by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid delimiter {0:?}: must be a single ASCII character other than a quote or newline")]
pub struct InvalidDelimiter(pub char);

/// Which side of the lookup join a problem was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    Transactions,
    Reference,
}

impl fmt::Display for JoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinSide::Transactions => f.write_str("combined data"),
            JoinSide::Reference => f.write_str("lookup file"),
        }
    }
}

#[derive(Debug, Error)]
pub enum JoinError {
    #[error("{side} is missing required column '{column}'")]
    MissingColumn { side: JoinSide, column: String },

    #[error("could not read lookup file: {}", user_message_from_calamine(.0))]
    Spreadsheet(#[from] calamine::Error),

    #[error("lookup file has no worksheet {0}")]
    MissingSheet(String),

    #[error("lookup file worksheet is empty")]
    EmptySheet,
}

/// A monetary cell that could not be coerced to a number for display.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("row {row}, column '{column}': '{value}' is not a number")]
pub struct FormatError {
    pub column: String,
    /// 1-based data row.
    pub row: usize,
    pub value: String,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("table of {rows} rows x {columns} columns exceeds worksheet limits")]
    TooLarge { rows: usize, columns: usize },
}
