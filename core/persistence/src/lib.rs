//! FILENAME: core/persistence/src/lib.rs
//! Population Dashboard Persistence Module
//!
//! Loads the population table from a CSV file, an XLSX workbook or a SQL
//! query, and exports dashboard reports to XLSX/CSV. Every source produces
//! the same immutable `Dataset`; `open_source` is the only place that
//! chooses between them.

mod csv_source;
mod error;
pub mod export;
mod sql_source;
mod xlsx_reader;

pub use csv_source::CsvSource;
pub use error::PersistenceError;
pub use export::{save_report_xlsx, write_table_csv};
pub use sql_source::{SqlSource, DEFAULT_QUERY};
pub use xlsx_reader::XlsxSource;

use dataset::{Dataset, MeasureConvention};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// DATA SOURCE
// ============================================================================

/// A collaborator that yields the full population table.
pub trait DataSource {
    /// Human-readable origin, used in log lines.
    fn describe(&self) -> String;

    /// Reads the whole table and classifies its columns with `convention`.
    fn load(&self, convention: &MeasureConvention) -> Result<Dataset, PersistenceError>;
}

// ============================================================================
// SOURCE CONFIGURATION
// ============================================================================

/// Serialized source selection, tagged by `kind`.
///
/// ```json
/// { "kind": "csv", "path": "population.csv" }
/// { "kind": "xlsx", "path": "population.xlsx", "sheet": "Data" }
/// { "kind": "sql", "database": "warehouse.db" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Csv {
        path: PathBuf,
        #[serde(default = "default_delimiter")]
        delimiter: char,
    },
    Xlsx {
        path: PathBuf,
        #[serde(default)]
        sheet: Option<String>,
    },
    Sql {
        database: PathBuf,
        #[serde(default = "default_query")]
        query: String,
    },
}

fn default_delimiter() -> char {
    ','
}

fn default_query() -> String {
    DEFAULT_QUERY.to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Csv {
            path: PathBuf::from("population_by_gender_age.csv"),
            delimiter: default_delimiter(),
        }
    }
}

/// Builds the collaborator named by `config`.
pub fn open_source(config: &SourceConfig) -> Result<Box<dyn DataSource>, PersistenceError> {
    let source: Box<dyn DataSource> = match config {
        SourceConfig::Csv { path, delimiter } => {
            let delimiter = u8::try_from(*delimiter).map_err(|_| {
                PersistenceError::InvalidFormat(format!("CSV delimiter must be ASCII, got {:?}", delimiter))
            })?;
            Box::new(CsvSource::new(path.clone()).with_delimiter(delimiter))
        }
        SourceConfig::Xlsx { path, sheet } => Box::new(XlsxSource::new(path.clone(), sheet.clone())),
        SourceConfig::Sql { database, query } => Box::new(SqlSource::new(database.clone(), query.clone())),
    };
    log::debug!(target: "SOURCE", "opened {}", source.describe());
    Ok(source)
}
