//! FILENAME: core/dataset/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Row {row} has {actual} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid measure value {value:?} in column {column} at row {row}")]
    InvalidMeasure {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Total measure column not found: {0}")]
    MissingTotalMeasure(String),
}
