//! FILENAME: core/persistence/src/export.rs
//! PURPOSE: Writes evaluated dashboard aggregates to XLSX and CSV.
//! CONTEXT: One worksheet per aggregate table, header row then data rows.
//! Scalar aggregates are gathered on a leading "summary" sheet.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use cascade_engine::{AggregateOutput, AggregateTable, NamedAggregate};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet};

use crate::PersistenceError;

/// Excel rejects longer worksheet names.
const MAX_SHEET_NAME: usize = 31;
const SUMMARY_SHEET: &str = "summary";

// ============================================================================
// XLSX
// ============================================================================

pub fn save_report_xlsx(aggregates: &[NamedAggregate], path: &Path) -> Result<(), PersistenceError> {
    let mut xlsx = XlsxWorkbook::new();
    let header = Format::new().set_bold();
    let number = Format::new().set_num_format("#,##0");
    let mut used = HashSet::new();

    let scalars: Vec<(&str, f64)> = aggregates
        .iter()
        .filter_map(|a| a.output.as_scalar().map(|v| (a.name.as_str(), v)))
        .collect();
    if !scalars.is_empty() {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(unique_sheet_name(SUMMARY_SHEET, &mut used))?;
        worksheet.write_string_with_format(0, 0, "aggregate", &header)?;
        worksheet.write_string_with_format(0, 1, "value", &header)?;
        for (i, (name, value)) in scalars.iter().enumerate() {
            let row = i as u32 + 1;
            worksheet.write_string(row, 0, *name)?;
            worksheet.write_number_with_format(row, 1, *value, &number)?;
        }
        worksheet.set_column_width(0, 32)?;
    }

    for aggregate in aggregates {
        if let AggregateOutput::Table(table) = &aggregate.output {
            let worksheet = xlsx.add_worksheet();
            worksheet.set_name(unique_sheet_name(&aggregate.name, &mut used))?;
            write_table_sheet(worksheet, table, &header, &number)?;
        }
    }

    xlsx.save(path)?;
    log::info!(target: "EXPORT", "saved {} aggregates to {}", aggregates.len(), path.display());
    Ok(())
}

fn write_table_sheet(
    worksheet: &mut Worksheet,
    table: &AggregateTable,
    header: &Format,
    number: &Format,
) -> Result<(), PersistenceError> {
    let value_col = table.key_columns.len() as u16;
    for (col, name) in table.key_columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, header)?;
        worksheet.set_column_width(col as u16, 20)?;
    }
    worksheet.write_string_with_format(0, value_col, &table.value_column, header)?;
    worksheet.set_column_width(value_col, 16)?;

    for (i, row) in table.rows.iter().enumerate() {
        let r = i as u32 + 1;
        for (col, key) in row.key.iter().enumerate() {
            worksheet.write_string(r, col as u16, key)?;
        }
        worksheet.write_number_with_format(r, value_col, row.value, number)?;
    }
    Ok(())
}

/// Truncates to the worksheet name limit and suffixes duplicates.
fn unique_sheet_name(name: &str, used: &mut HashSet<String>) -> String {
    let base: String = name.chars().take(MAX_SHEET_NAME).collect();
    let mut candidate = base.clone();
    let mut n = 2;
    while used.contains(&candidate) {
        let suffix = format!("~{}", n);
        let keep = MAX_SHEET_NAME - suffix.len();
        candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

// ============================================================================
// CSV
// ============================================================================

/// Writes `table` as CSV: key columns, then the value column.
pub fn write_table_csv<W: Write>(table: &AggregateTable, writer: W) -> Result<(), PersistenceError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = table.key_columns.iter().map(String::as_str).collect();
    header.push(&table.value_column);
    csv_writer.write_record(&header)?;

    for row in &table.rows {
        let mut record: Vec<String> = row.key.clone();
        record.push(format_number(row.value));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use cascade_engine::AggregateRow;

    fn table(key_columns: &[&str], rows: &[(&[&str], f64)]) -> AggregateTable {
        AggregateTable {
            key_columns: key_columns.iter().map(|s| s.to_string()).collect(),
            value_column: "group_all_ages".to_string(),
            rows: rows
                .iter()
                .map(|(key, value)| AggregateRow {
                    key: key.iter().map(|s| s.to_string()).collect(),
                    value: *value,
                })
                .collect(),
        }
    }

    #[test]
    fn test_table_csv_output() {
        let table = table(&["province_name", "gender"], &[(&["A", "M"], 10.0), (&["A", "F"], 12.5)]);
        let mut out = Vec::new();
        write_table_csv(&table, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "province_name,gender,group_all_ages\nA,M,10\nA,F,12.5\n"
        );
    }

    #[test]
    fn test_sheet_names_are_truncated_and_unique() {
        let mut used = HashSet::new();
        let long = "adult_population_by_province_gender";
        let first = unique_sheet_name(long, &mut used);
        assert_eq!(first, "adult_population_by_province_ge");
        let second = unique_sheet_name(long, &mut used);
        assert_eq!(second.len(), MAX_SHEET_NAME);
        assert!(second.ends_with("~2"));
        assert_eq!(unique_sheet_name("summary", &mut used), "summary");
    }

    #[test]
    fn test_report_workbook_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let aggregates = vec![
            NamedAggregate {
                name: "total_population".to_string(),
                output: AggregateOutput::Scalar(34.0),
            },
            NamedAggregate {
                name: "gender_distribution".to_string(),
                output: AggregateOutput::Table(table(&["gender"], &[(&["M"], 15.0), (&["F"], 19.0)])),
            },
        ];
        save_report_xlsx(&aggregates, &path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(
            workbook.sheet_names().to_vec(),
            vec!["summary".to_string(), "gender_distribution".to_string()]
        );

        let summary = workbook.worksheet_range("summary").unwrap();
        assert_eq!(summary.get_value((1, 0)), Some(&Data::String("total_population".to_string())));
        assert_eq!(summary.get_value((1, 1)), Some(&Data::Float(34.0)));

        let gender = workbook.worksheet_range("gender_distribution").unwrap();
        assert_eq!(gender.height(), 3);
        assert_eq!(gender.get_value((2, 0)), Some(&Data::String("F".to_string())));
        assert_eq!(gender.get_value((2, 1)), Some(&Data::Float(19.0)));
    }
}
