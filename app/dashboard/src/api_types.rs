//! FILENAME: app/dashboard/src/api_types.rs
// PURPOSE: Shared type definitions returned by dashboard commands.
// CONTEXT: All structs use camelCase serialization for JSON output.

use cascade_engine::{NamedAggregate, RankedBreakdown};
use serde::{Deserialize, Serialize};

/// One dropdown of the filter sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterWidget {
    pub label: String,
    pub column: String,
    /// `"All"` followed by the values available under earlier filters.
    pub options: Vec<String>,
    pub selected: String,
    /// The selection is not among `options` and matches no rows.
    pub stale: bool,
}

/// The sidebar, computed top-down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPanel {
    pub widgets: Vec<FilterWidget>,
    pub row_count: usize,
    /// Facets reset to `All` by the last change.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pruned: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilter {
    pub facet: String,
    pub value: String,
}

/// Everything the dashboard shows for the current selections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    /// RFC 3339 timestamp.
    pub generated_at: String,
    pub filters: Vec<AppliedFilter>,
    pub row_count: usize,
    pub aggregates: Vec<NamedAggregate>,
    pub top_districts: RankedBreakdown,
}

impl DashboardReport {
    pub fn aggregate(&self, name: &str) -> Option<&NamedAggregate> {
        self.aggregates.iter().find(|a| a.name == name)
    }
}

/// The "Table" view: subset rows as display strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Rows in the subset, before the limit.
    pub total_rows: usize,
}
