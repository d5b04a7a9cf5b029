//! Errors raised while loading and preparing the input tables.

use std::fmt;
use std::path::PathBuf;

/// The three input tables, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Mortality,
    Divisions,
    Causes,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Mortality => write!(f, "mortality"),
            Table::Divisions => write!(f, "division"),
            Table::Causes => write!(f, "cause"),
        }
    }
}

/// Fatal preparation errors. A join miss is never one of these.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// The input file could not be opened.
    #[error("failed to open {table} table at {path}: {source}")]
    Io {
        table: Table,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not readable as delimited text.
    #[error("failed to read {table} table: {source}")]
    Csv {
        table: Table,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from the header row.
    #[error("{table} table is missing required column '{column}'")]
    MissingColumn { table: Table, column: String },

    /// A cell could not be converted to its typed field.
    #[error("{table} table, line {line}: invalid {column} value '{value}'")]
    InvalidValue {
        table: Table,
        line: u64,
        column: String,
        value: String,
    },
}

/// Result type for data loading and preparation.
pub type Result<T> = std::result::Result<T, DataError>;
