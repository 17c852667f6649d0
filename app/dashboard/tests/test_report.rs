//! FILENAME: tests/test_report.rs
//! Integration tests for the dashboard report and its exports.

mod common;

use app_lib::{apply_selections, filtered_rows, render};
use cascade_engine::{AggregateOutput, NamedAggregate};
use common::{strings, TestHarness};
use pretty_assertions::assert_eq;

fn owned(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

// ============================================================================
// AGGREGATES
// ============================================================================

#[test]
fn test_full_dataset_report() {
    let harness = TestHarness::new();
    assert_eq!(harness.scalar("total_population"), 3520.0);
    assert_eq!(harness.scalar("total_adult_population"), 2285.0);
    assert_eq!(
        harness.pairs("gender_distribution"),
        owned(&[("M", 1750.0), ("F", 1770.0)])
    );
    assert_eq!(
        harness.pairs("population_by_province"),
        owned(&[("Punjab", 1480.0), ("Sindh", 2040.0)])
    );
    assert_eq!(
        harness.pairs("population_by_area_type"),
        owned(&[("Urban", 2930.0), ("Rural", 590.0)])
    );
    assert_eq!(
        harness.pairs("senior_population_by_province"),
        owned(&[("Punjab", 140.0), ("Sindh", 158.0)])
    );
    assert_eq!(
        harness.pairs("age_group_distribution"),
        owned(&[("group_18_and_up", 2285.0), ("group_60_and_up", 298.0)])
    );
}

#[test]
fn test_report_follows_selections() {
    let harness = TestHarness::new();
    harness.select("Province", "Punjab").unwrap();
    harness.select("Area Type", "Urban").unwrap();

    let report = harness.report();
    assert_eq!(report.row_count, 2);
    assert_eq!(
        report.filters.iter().map(|f| f.value.as_str()).collect::<Vec<_>>(),
        vec!["Punjab", "All", "Urban", "All"]
    );
    assert_eq!(harness.scalar("total_population"), 1180.0);
    assert_eq!(harness.pairs("adult_population_by_gender"), owned(&[("M", 400.0), ("F", 390.0)]));
}

#[test]
fn test_top_districts_breakdown() {
    let mut config = app_lib::DashboardConfig::default();
    config.top_n = 2;
    let harness = TestHarness::with_config(config);

    let top = harness.report().top_districts;
    let ranking: Vec<(String, f64)> = top.ranking.iter().map(|r| (r.key.clone(), r.value)).collect();
    assert_eq!(ranking, owned(&[("Karachi", 1750.0), ("Lahore", 1280.0)]));

    let rows: Vec<(Vec<String>, f64)> = top.table.rows.iter().map(|r| (r.key.clone(), r.value)).collect();
    assert_eq!(
        rows,
        vec![
            (strings(&["Lahore", "Urban"]), 1180.0),
            (strings(&["Lahore", "Rural"]), 100.0),
            (strings(&["Karachi", "Urban"]), 1750.0),
        ]
    );
}

#[test]
fn test_report_json_shape() {
    let harness = TestHarness::new();
    let report = harness.report();
    let json = serde_json::to_value(&report).unwrap();

    let generated = json["generatedAt"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(generated).is_ok());
    assert_eq!(json["rowCount"], 8);
    assert_eq!(json["aggregates"][0]["name"], "total_population");
    assert_eq!(json["aggregates"][0]["output"]["kind"], "scalar");
    assert_eq!(json["aggregates"][0]["output"]["data"], 3520.0);

    let back: app_lib::DashboardReport = serde_json::from_value(json).unwrap();
    assert_eq!(back, report);
}

// ============================================================================
// TABLE VIEW AND EXPORT
// ============================================================================

#[test]
fn test_filtered_rows_view() {
    let harness = TestHarness::new();
    apply_selections(
        &harness.state,
        harness.session,
        &[("gender".to_string(), "F".to_string())],
    )
    .unwrap();

    let view = filtered_rows(&harness.state, harness.session, Some(2)).unwrap();
    assert_eq!(view.headers[0], "province_name");
    assert_eq!(view.total_rows, 4);
    assert_eq!(view.rows.len(), 2);
    assert_eq!(
        view.rows[0],
        strings(&["Punjab", "Lahore", "Urban", "F", "580", "390", "55"])
    );
}

#[test]
fn test_selections_applied_in_facet_order() {
    let harness = TestHarness::new();
    // District is listed first but only valid once the province is applied.
    let panel = apply_selections(
        &harness.state,
        harness.session,
        &[
            ("District".to_string(), "Thar".to_string()),
            ("Province".to_string(), "Sindh".to_string()),
        ],
    )
    .unwrap();
    assert_eq!(panel.row_count, 2);
}

#[test]
fn test_rejected_batch_leaves_session_unchanged() {
    let harness = TestHarness::new();
    let result = apply_selections(
        &harness.state,
        harness.session,
        &[
            ("Province".to_string(), "Sindh".to_string()),
            ("District".to_string(), "Lahore".to_string()),
        ],
    );
    assert!(matches!(
        result.as_ref().map_err(|e| e.invalid_selection()),
        Err(Some(("District", "Lahore")))
    ));

    let panel = harness.panel();
    assert_eq!(panel.widgets[0].selected, "All");
    assert_eq!(panel.widgets[1].selected, "All");
    assert_eq!(panel.row_count, 8);
}

#[test]
fn test_text_report_uses_thousands_separators() {
    let harness = TestHarness::new();
    let text = render::render_report(&harness.report());
    assert!(text.contains("Total Population: 3,520"));
    assert!(text.contains("Total Adult Population: 2,285"));
    assert!(text.contains("Top 4 Districts by Population (Urban vs Rural)"));
}

#[test]
fn test_export_report_xlsx() {
    let harness = TestHarness::new();
    let report = harness.report();
    let mut sheets = report.aggregates.clone();
    sheets.push(NamedAggregate {
        name: "top_districts".to_string(),
        output: AggregateOutput::Table(report.top_districts.table.clone()),
    });

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xlsx");
    persistence::save_report_xlsx(&sheets, &path).unwrap();
    assert!(path.metadata().unwrap().len() > 0);
}
