//! FILENAME: core/cascade-engine/src/error.rs

use dataset::ColumnKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Recoverable: re-query `options_for` and retry, or reset to `All`.
    #[error("Invalid selection {value:?} for facet {facet}")]
    InvalidSelection { facet: String, value: String },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column {column} is not a {expected:?} column")]
    ColumnKind { column: String, expected: ColumnKind },

    #[error("Facet index out of range: {0}")]
    FacetOutOfRange(usize),

    #[error("Unknown facet: {0}")]
    UnknownFacet(String),

    #[error("Subset schema does not match the catalog schema")]
    SchemaMismatch,
}
