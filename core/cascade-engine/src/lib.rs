//! FILENAME: core/cascade-engine/src/lib.rs
//! Cascading filter and aggregation subsystem for the population dashboard.
//!
//! This crate is pure and synchronous: it consumes an already materialized
//! `dataset::Dataset` and produces aggregate tables. It never fetches data and
//! never renders anything.
//!
//! Layers:
//! - `definition`: Facets, selections and aggregation specs (what to compute)
//! - `cascade`: Ordered facet selections and their derived option lists
//! - `subset`: The row view produced by applying selections
//! - `aggregate`: Groupby evaluation of one spec (how we compute)
//! - `catalog`: The fixed battery of dashboard aggregations
//! - `ranking`: Top-N selection and key-restricted breakdowns

pub mod aggregate;
pub mod cascade;
pub mod catalog;
pub mod definition;
pub mod error;
pub mod ranking;
pub mod subset;


pub use aggregate::{evaluate, AggregateOutput, AggregateRow, AggregateTable};
pub use cascade::FilterCascade;
pub use catalog::{Catalog, CatalogColumns, NamedAggregate};
pub use definition::*;
pub use error::EngineError;
pub use ranking::{restrict_to_keys, top_n, top_n_breakdown, RankedBreakdown, RankedKey};
pub use subset::FilteredSubset;
