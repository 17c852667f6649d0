//! FILENAME: app/dashboard/src/render.rs
// PURPOSE: Plain-text rendering of panels, reports and table views.

use cascade_engine::{AggregateOutput, AggregateTable};

use crate::api_types::{DashboardReport, FilterPanel, RowsView};

/// `1234567` -> `"1,234,567"`; fractional values keep two decimals.
pub fn format_thousands(value: f64) -> String {
    let negative = value < 0.0;
    let abs = value.abs();
    let text = if abs.fract() == 0.0 {
        format!("{:.0}", abs)
    } else {
        format!("{:.2}", abs)
    };
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Dashboard heading for a catalog entry.
pub fn title_for(name: &str) -> &str {
    match name {
        "total_population" => "Total Population",
        "gender_distribution" => "Gender Distribution",
        "population_by_province" => "Population by Province",
        "age_group_distribution" => "Age Group Distribution",
        "population_by_area_type" => "Urban vs Rural Population",
        "senior_population_by_province" => "Senior Citizen Population by Province (60+ Age)",
        "total_adult_population" => "Total Adult Population",
        "adult_population_by_gender" => "Adult Population by Gender (18+ Age)",
        "adult_population_by_province" => "Adult Population by Province",
        "adult_population_by_province_gender" => "Adult Population by Province (Stacked by Gender)",
        other => other,
    }
}

pub fn render_panel(panel: &FilterPanel) -> String {
    let mut out = String::from("Filters\n");
    for widget in &panel.widgets {
        let marker = if widget.stale { " (stale)" } else { "" };
        out.push_str(&format!("  {}: {}{}\n", widget.label, widget.selected, marker));
        out.push_str(&format!("    options: {}\n", widget.options.join(", ")));
    }
    if !panel.pruned.is_empty() {
        out.push_str(&format!("  reset to All: {}\n", panel.pruned.join(", ")));
    }
    out.push_str(&format!("Rows: {}\n", format_thousands(panel.row_count as f64)));
    out
}

pub fn render_report(report: &DashboardReport) -> String {
    let mut out = String::from("Population Statistics Dashboard\n");
    let filters: Vec<String> = report
        .filters
        .iter()
        .map(|f| format!("{}={}", f.facet, f.value))
        .collect();
    out.push_str(&format!("Filters: {}\n", filters.join(", ")));
    out.push_str(&format!("Rows: {}\n", format_thousands(report.row_count as f64)));

    for aggregate in &report.aggregates {
        out.push('\n');
        match &aggregate.output {
            AggregateOutput::Scalar(value) => {
                out.push_str(&format!("{}: {}\n", title_for(&aggregate.name), format_thousands(*value)));
            }
            AggregateOutput::Table(table) => {
                out.push_str(&format!("{}\n", title_for(&aggregate.name)));
                out.push_str(&render_table(table));
            }
        }
    }

    out.push_str(&format!(
        "\nTop {} Districts by Population (Urban vs Rural)\n",
        report.top_districts.ranking.len()
    ));
    for ranked in &report.top_districts.ranking {
        out.push_str(&format!("  {}  {}\n", ranked.key, format_thousands(ranked.value)));
    }
    out.push_str(&render_table(&report.top_districts.table));
    out
}

/// Aligned key columns followed by a right-aligned value.
pub fn render_table(table: &AggregateTable) -> String {
    if table.is_empty() {
        return "  (no data)\n".to_string();
    }

    let mut widths: Vec<usize> = table.key_columns.iter().map(|c| c.chars().count()).collect();
    let values: Vec<String> = table.rows.iter().map(|r| format_thousands(r.value)).collect();
    for row in &table.rows {
        for (width, key) in widths.iter_mut().zip(&row.key) {
            *width = (*width).max(key.chars().count());
        }
    }
    let value_width = values
        .iter()
        .map(String::len)
        .chain(std::iter::once(table.value_column.len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let mut line = String::from(" ");
    for (name, width) in table.key_columns.iter().zip(&widths) {
        line.push_str(&format!(" {:<width$}", name, width = *width));
    }
    line.push_str(&format!(" {:>width$}", table.value_column, width = value_width));
    out.push_str(line.trim_end());
    out.push('\n');

    for (row, value) in table.rows.iter().zip(&values) {
        let mut line = String::from(" ");
        for (key, width) in row.key.iter().zip(&widths) {
            line.push_str(&format!(" {:<width$}", key, width = *width));
        }
        line.push_str(&format!(" {:>width$}", value, width = value_width));
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub fn render_rows(view: &RowsView) -> String {
    let mut out = view.headers.join("\t");
    out.push('\n');
    for row in &view.rows {
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    out.push_str(&format!(
        "({} of {} rows)\n",
        format_thousands(view.rows.len() as f64),
        format_thousands(view.total_rows as f64)
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_engine::AggregateRow;

    #[test]
    fn test_thousands_separators() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1234.0), "1,234");
        assert_eq!(format_thousands(241_499_431.0), "241,499,431");
        assert_eq!(format_thousands(1234.5), "1,234.50");
        assert_eq!(format_thousands(-1000.0), "-1,000");
    }

    #[test]
    fn test_titles() {
        assert_eq!(title_for("total_population"), "Total Population");
        assert_eq!(title_for("custom_table"), "custom_table");
    }

    #[test]
    fn test_table_alignment() {
        let table = AggregateTable {
            key_columns: vec!["gender".to_string()],
            value_column: "group_all_ages".to_string(),
            rows: vec![
                AggregateRow {
                    key: vec!["M".to_string()],
                    value: 1500.0,
                },
                AggregateRow {
                    key: vec!["F".to_string()],
                    value: 19.0,
                },
            ],
        };
        let text = render_table(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "  gender group_all_ages");
        assert_eq!(lines[1], "  M               1,500");
        assert_eq!(lines[2], "  F                  19");
    }
}
