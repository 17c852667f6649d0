//! FILENAME: core/persistence/src/csv_source.rs
//! PURPOSE: Reads the population table from a delimited text file.

use std::path::PathBuf;

use dataset::{Dataset, DatasetBuilder, MeasureConvention, Value};

use crate::{DataSource, PersistenceError};

/// The header row names the columns; cells are read as text and typed by
/// the dataset builder.
#[derive(Debug, Clone)]
pub struct CsvSource {
    pub path: PathBuf,
    pub delimiter: u8,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvSource {
            path: path.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Loads from any reader; `load` opens the configured path.
    pub fn load_from<R: std::io::Read>(
        &self,
        reader: R,
        convention: &MeasureConvention,
    ) -> Result<Dataset, PersistenceError> {
        // Ragged rows are reported by the builder with their row number.
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let mut builder = DatasetBuilder::new(headers, convention.clone())?;

        for record in csv_reader.records() {
            let record = record?;
            builder.push_row(record.iter().map(cell_value).collect())?;
        }

        Ok(builder.finish()?)
    }
}

fn cell_value(cell: &str) -> Value {
    if cell.is_empty() {
        Value::Empty
    } else {
        Value::Text(cell.to_string())
    }
}

impl DataSource for CsvSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn load(&self, convention: &MeasureConvention) -> Result<Dataset, PersistenceError> {
        let file = std::fs::File::open(&self.path)?;
        let dataset = self.load_from(file, convention)?;
        log::info!(target: "SOURCE", "{} loaded {} rows", self.describe(), dataset.len());
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataset::DatasetError;
    use std::io::Write;

    const SAMPLE: &str = "\
province_name,district_name,area_type,gender,group_all_ages,group_18_and_up
A,D1,Urban,M,10,6
A,D1,Urban,F,12,8
B,D2,Rural,M,5,
";

    #[test]
    fn test_loads_header_and_rows() {
        let dataset = CsvSource::new("unused")
            .load_from(SAMPLE.as_bytes(), &MeasureConvention::default())
            .unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.schema().len(), 6);

        let last = dataset.row(2).unwrap();
        assert_eq!(last.category("province_name"), Some("B"));
        // Empty measure cells count as zero.
        assert_eq!(last.measure("group_18_and_up"), Some(0.0));
    }

    #[test]
    fn test_semicolon_delimiter() {
        let text = "gender;group_all_ages\nM;3\nF;4\n";
        let dataset = CsvSource::new("unused")
            .with_delimiter(b';')
            .load_from(text.as_bytes(), &MeasureConvention::default())
            .unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.row(1).unwrap().measure("group_all_ages"), Some(4.0));
    }

    #[test]
    fn test_non_numeric_measure_is_an_error() {
        let text = "gender,group_all_ages\nM,many\n";
        let err = CsvSource::new("unused")
            .load_from(text.as_bytes(), &MeasureConvention::default())
            .unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Dataset(DatasetError::InvalidMeasure { .. })
        ));
    }

    #[test]
    fn test_ragged_row_is_an_error() {
        let text = "gender,group_all_ages\nM,1,2\n";
        let err = CsvSource::new("unused")
            .load_from(text.as_bytes(), &MeasureConvention::default())
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Dataset(DatasetError::RowWidth { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let source = CsvSource::new(file.path());
        let dataset = source.load(&MeasureConvention::default()).unwrap();
        assert_eq!(dataset.len(), 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvSource::new(dir.path().join("absent.csv"));
        assert!(matches!(
            source.load(&MeasureConvention::default()),
            Err(PersistenceError::Io(_))
        ));
    }
}
