//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for dashboard integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use app_lib::{
    get_filter_panel, open_session, render_report, select, AppError, AppState, DashboardConfig,
    DashboardReport, FilterPanel, SessionId,
};
use dataset::{Dataset, MeasureConvention, Value};
use persistence::SourceConfig;

pub const HEADERS: [&str; 7] = [
    "province_name",
    "district_name",
    "area_type",
    "gender",
    "group_all_ages",
    "group_18_and_up",
    "group_60_and_up",
];

/// (province, district, area, gender, all ages, 18+, 60+)
pub const ROWS: [(&str, &str, &str, &str, f64, f64, f64); 8] = [
    ("Punjab", "Lahore", "Urban", "M", 600.0, 400.0, 50.0),
    ("Punjab", "Lahore", "Urban", "F", 580.0, 390.0, 55.0),
    ("Punjab", "Lahore", "Rural", "M", 100.0, 60.0, 10.0),
    ("Punjab", "Attock", "Rural", "F", 200.0, 120.0, 25.0),
    ("Sindh", "Karachi", "Urban", "M", 900.0, 600.0, 70.0),
    ("Sindh", "Karachi", "Urban", "F", 850.0, 560.0, 65.0),
    ("Sindh", "Thar", "Rural", "M", 150.0, 80.0, 12.0),
    ("Sindh", "Thar", "Rural", "F", 140.0, 75.0, 11.0),
];

pub fn fixture_dataset() -> Dataset {
    let rows = ROWS
        .iter()
        .map(|&(p, d, a, g, all, adult, senior)| {
            vec![
                Value::from(p),
                Value::from(d),
                Value::from(a),
                Value::from(g),
                Value::Number(all),
                Value::Number(adult),
                Value::Number(senior),
            ]
        })
        .collect();
    let headers = HEADERS.iter().map(|s| s.to_string()).collect();
    Dataset::from_rows(headers, rows, MeasureConvention::default()).unwrap()
}

/// The fixture as CSV text.
pub fn fixture_csv() -> String {
    let mut text = HEADERS.join(",");
    text.push('\n');
    for (p, d, a, g, all, adult, senior) in ROWS {
        text.push_str(&format!("{},{},{},{},{},{},{}\n", p, d, a, g, all, adult, senior));
    }
    text
}

pub fn write_fixture_csv(dir: &Path) -> PathBuf {
    let path = dir.join("population_by_gender_age.csv");
    std::fs::write(&path, fixture_csv()).unwrap();
    path
}

pub fn csv_config(path: PathBuf) -> DashboardConfig {
    DashboardConfig {
        source: SourceConfig::Csv { path, delimiter: ',' },
        ..DashboardConfig::default()
    }
}

/// Test harness holding shared state and one open session.
pub struct TestHarness {
    pub state: AppState,
    pub session: SessionId,
}

impl TestHarness {
    /// Fixture data with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DashboardConfig::default())
    }

    pub fn with_config(config: DashboardConfig) -> Self {
        let state = AppState::with_dataset(config, fixture_dataset()).unwrap();
        let session = open_session(&state).unwrap();
        TestHarness { state, session }
    }

    pub fn select(&self, facet: &str, value: &str) -> Result<FilterPanel, AppError> {
        select(&self.state, self.session, facet, value)
    }

    pub fn panel(&self) -> FilterPanel {
        get_filter_panel(&self.state, self.session).unwrap()
    }

    pub fn options(&self, facet: &str) -> Vec<String> {
        self.panel()
            .widgets
            .into_iter()
            .find(|w| w.label == facet || w.column == facet)
            .map(|w| w.options)
            .unwrap()
    }

    pub fn report(&self) -> DashboardReport {
        render_report(&self.state, self.session).unwrap()
    }

    /// Scalar aggregate value from the current report.
    pub fn scalar(&self, name: &str) -> f64 {
        self.report().aggregate(name).unwrap().output.as_scalar().unwrap()
    }

    /// Single-key table of a named aggregate as owned pairs.
    pub fn pairs(&self, name: &str) -> Vec<(String, f64)> {
        self.report()
            .aggregate(name)
            .unwrap()
            .output
            .as_table()
            .unwrap()
            .pairs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
