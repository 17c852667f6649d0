//! FILENAME: core/persistence/src/sql_source.rs
//! PURPOSE: Query-backed source over a SQLite database.
//! CONTEXT: Stands in for the warehouse query behind the dashboard;
//! column names come from the prepared statement, so any query whose result
//! set follows the population layout can be used.

use std::path::PathBuf;

use dataset::{Dataset, DatasetBuilder, MeasureConvention, Value};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use crate::{DataSource, PersistenceError};

pub const DEFAULT_QUERY: &str = "SELECT * FROM population_by_gender_age";

#[derive(Debug, Clone)]
pub struct SqlSource {
    pub database: PathBuf,
    pub query: String,
}

impl SqlSource {
    pub fn new(database: impl Into<PathBuf>, query: impl Into<String>) -> Self {
        SqlSource {
            database: database.into(),
            query: query.into(),
        }
    }

    /// Runs the query on an already-open connection.
    pub fn load_from(&self, conn: &Connection, convention: &MeasureConvention) -> Result<Dataset, PersistenceError> {
        let mut stmt = conn.prepare(&self.query)?;
        let headers: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = headers.len();
        let mut builder = DatasetBuilder::new(headers, convention.clone())?;

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for index in 0..width {
                values.push(cell_value(row.get_ref(index)?)?);
            }
            builder.push_row(values)?;
        }

        Ok(builder.finish()?)
    }
}

fn cell_value(value: ValueRef<'_>) -> Result<Value, PersistenceError> {
    Ok(match value {
        ValueRef::Null => Value::Empty,
        ValueRef::Integer(i) => Value::Number(i as f64),
        ValueRef::Real(f) => Value::Number(f),
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Value::Text(text.to_string()),
            Err(e) => return Err(PersistenceError::InvalidFormat(format!("text cell is not valid UTF-8: {}", e))),
        },
        ValueRef::Blob(_) => {
            return Err(PersistenceError::InvalidFormat(
                "BLOB columns are not supported".to_string(),
            ))
        }
    })
}

impl DataSource for SqlSource {
    fn describe(&self) -> String {
        format!("sql:{} ({})", self.database.display(), self.query)
    }

    fn load(&self, convention: &MeasureConvention) -> Result<Dataset, PersistenceError> {
        let conn = Connection::open_with_flags(&self.database, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let dataset = self.load_from(&conn, convention)?;
        log::info!(target: "SOURCE", "{} loaded {} rows", self.describe(), dataset.len());
        Ok(dataset)
    }
}
