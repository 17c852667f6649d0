// FILENAME: core\persistence\src\xlsx_reader.rs

use crate::{DataSource, PersistenceError};
use calamine::{open_workbook, Data, Reader, Xlsx};
use dataset::{Dataset, DatasetBuilder, MeasureConvention, Value};
use std::path::PathBuf;

/// Reads one worksheet; the first row is the header.
#[derive(Debug, Clone)]
pub struct XlsxSource {
    pub path: PathBuf,
    /// Worksheet to read; the first sheet when `None`.
    pub sheet: Option<String>,
}

impl XlsxSource {
    pub fn new(path: impl Into<PathBuf>, sheet: Option<String>) -> Self {
        XlsxSource {
            path: path.into(),
            sheet,
        }
    }
}

impl DataSource for XlsxSource {
    fn describe(&self) -> String {
        match &self.sheet {
            Some(sheet) => format!("xlsx:{}[{}]", self.path.display(), sheet),
            None => format!("xlsx:{}", self.path.display()),
        }
    }

    fn load(&self, convention: &MeasureConvention) -> Result<Dataset, PersistenceError> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path)?;
        let sheet_names = workbook.sheet_names().to_vec();

        let sheet_name = match &self.sheet {
            Some(name) if sheet_names.contains(name) => name.clone(),
            Some(name) => return Err(PersistenceError::SheetNotFound(name.clone())),
            None => sheet_names.first().cloned().ok_or_else(|| {
                PersistenceError::InvalidFormat("Workbook contains no sheets".to_string())
            })?,
        };

        let range = workbook.worksheet_range(&sheet_name)?;
        let mut rows = range.rows();

        let headers: Vec<String> = rows
            .next()
            .ok_or_else(|| PersistenceError::InvalidFormat(format!("Sheet {} has no header row", sheet_name)))?
            .iter()
            .map(|cell| cell.to_string())
            .collect();

        let mut builder = DatasetBuilder::new(headers, convention.clone())?;
        builder.reserve(range.height().saturating_sub(1));

        for row in rows {
            // Fully blank rows inside the used range are not data.
            if row.iter().all(|cell| matches!(cell, Data::Empty)) {
                continue;
            }
            builder.push_row(row.iter().map(cell_value).collect())?;
        }

        let dataset = builder.finish()?;
        log::info!(target: "SOURCE", "{} loaded {} rows", self.describe(), dataset.len());
        Ok(dataset)
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Empty,
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(f) => Value::Number(*f),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::Error(e) => Value::Text(format!("{:?}", e)),
        Data::DateTime(dt) => Value::Number(dt.as_f64()),
        Data::DateTimeIso(s) => Value::Text(s.clone()),
        Data::DurationIso(s) => Value::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use std::path::Path;

    fn write_fixture(path: &Path, sheet: &str) {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet).unwrap();
        let headers = ["province_name", "gender", "group_all_ages", "group_18_and_up"];
        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header).unwrap();
        }
        worksheet.write_string(1, 0, "A").unwrap();
        worksheet.write_string(1, 1, "M").unwrap();
        worksheet.write_number(1, 2, 10.0).unwrap();
        worksheet.write_number(1, 3, 6.0).unwrap();
        worksheet.write_string(2, 0, "B").unwrap();
        worksheet.write_string(2, 1, "F").unwrap();
        worksheet.write_number(2, 2, 7.0).unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_reads_first_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("population.xlsx");
        write_fixture(&path, "Data");

        let dataset = XlsxSource::new(&path, None)
            .load(&MeasureConvention::default())
            .unwrap();
        assert_eq!(dataset.len(), 2);
        let row = dataset.row(1).unwrap();
        assert_eq!(row.category("province_name"), Some("B"));
        assert_eq!(row.measure("group_all_ages"), Some(7.0));
        assert_eq!(row.measure("group_18_and_up"), Some(0.0));
    }

    #[test]
    fn test_named_sheet_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("population.xlsx");
        write_fixture(&path, "Data");

        let loaded = XlsxSource::new(&path, Some("Data".to_string())).load(&MeasureConvention::default());
        assert!(loaded.is_ok());

        let missing = XlsxSource::new(&path, Some("Census".to_string())).load(&MeasureConvention::default());
        assert!(matches!(missing, Err(PersistenceError::SheetNotFound(name)) if name == "Census"));
    }
}
