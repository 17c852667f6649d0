//! FILENAME: core/dataset/src/lib.rs
//! PURPOSE: Main library entry point for the population dataset.
//! CONTEXT: Re-exports the shared tabular types used by the cascade engine,
//! the data-source collaborators and the dashboard application.

pub mod column;
pub mod dataset;
pub mod error;
pub mod schema;
pub mod value;

pub use column::{CategoryColumn, ValueId};
pub use dataset::{Dataset, DatasetBuilder, RowRef};
pub use error::DatasetError;
pub use schema::{CategoryRef, ColumnDef, ColumnIndex, ColumnKind, MeasureConvention, MeasureRef, Schema};
pub use value::Value;
