//! Error types for the brackets engine.

use crate::{RecordId, Table};
use thiserror::Error;

/// All possible errors from the brackets engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Input errors
    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("selector not supported for {operation}: {selector}")]
    InvalidSelector {
        operation: &'static str,
        selector: String,
    },

    // Addressing errors
    #[error("position {position} out of range for table '{table}' (len {len})")]
    PositionOutOfRange {
        table: Table,
        position: usize,
        len: usize,
    },

    #[error("record not found in table '{table}': {id}")]
    RecordNotFound { table: Table, id: RecordId },

    #[error("no ids left to assign in table '{table}'")]
    IdSpaceExhausted { table: Table },

    // State errors
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
