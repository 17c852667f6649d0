//! FILENAME: core/cascade-engine/src/definition.rs
//! Dashboard definition - the serializable description of filters and aggregations.
//!
//! These structures are immutable snapshots of intent. Nothing here touches
//! rows; the cascade and the aggregation engine interpret them.

use serde::{Deserialize, Serialize};

/// Option label standing for "no restriction on this facet".
pub const ALL_LABEL: &str = "All";

/// Number of keys kept by the ranked district view.
pub const DEFAULT_TOP_N: usize = 20;

// ============================================================================
// FACETS
// ============================================================================

/// A categorical column participating in the cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    /// Display label (e.g. "Province").
    pub label: String,
    /// Source column name (e.g. "province_name").
    pub column: String,
}

impl Facet {
    pub fn new(label: impl Into<String>, column: impl Into<String>) -> Self {
        Facet {
            label: label.into(),
            column: column.into(),
        }
    }

    /// Matches either the display label or the column name, exactly.
    pub fn answers_to(&self, name: &str) -> bool {
        self.label == name || self.column == name
    }
}

/// The ordered facet list. Position defines dependency direction: a facet's
/// options depend on the facets before it, never after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetSet {
    pub facets: Vec<Facet>,
}

impl FacetSet {
    pub fn new(facets: Vec<Facet>) -> Self {
        FacetSet { facets }
    }

    /// Province -> District -> Area Type -> Gender.
    pub fn population(province: &str, district: &str, area_type: &str, gender: &str) -> Self {
        FacetSet {
            facets: vec![
                Facet::new("Province", province),
                Facet::new("District", district),
                Facet::new("Area Type", area_type),
                Facet::new("Gender", gender),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }
}

impl Default for FacetSet {
    fn default() -> Self {
        FacetSet::population("province_name", "district_name", "area_type", "gender")
    }
}

// ============================================================================
// SELECTION
// ============================================================================

/// The current choice on one facet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Selection {
    /// No restriction.
    #[default]
    All,
    /// Exact, case-sensitive match on one value.
    Value(String),
}

impl Selection {
    /// Parses a widget label; `"All"` maps back to `Selection::All`.
    pub fn from_label(label: &str) -> Self {
        if label == ALL_LABEL {
            Selection::All
        } else {
            Selection::Value(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Selection::All => ALL_LABEL,
            Selection::Value(v) => v,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

/// Order of the unique values listed after `"All"` in a facet's options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptionOrder {
    /// Order of first appearance in the prior subset.
    #[default]
    SourceOrder,
    /// Ascending lexicographic order.
    Sorted,
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Reduction applied to the measure within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Reducer {
    #[default]
    Sum,
    Count,
    Mean,
    Min,
    Max,
}

/// What gets reduced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureSource {
    /// A single measure column.
    Column(String),
    /// Several measure columns melted into one key column: one output row per
    /// (group key, column), keyed by the column name.
    Melt {
        columns: Vec<String>,
        key_column: String,
    },
}

/// One named summary table: group-by columns + measure + reducer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSpec {
    pub name: String,
    /// Categorical columns forming the composite group key, outer to inner.
    pub group_by: Vec<String>,
    pub measure: MeasureSource,
    pub reducer: Reducer,
}

impl AggregationSpec {
    /// `measure` summed per distinct `group_by` key.
    pub fn sum(name: impl Into<String>, group_by: &[&str], measure: impl Into<String>) -> Self {
        AggregationSpec {
            name: name.into(),
            group_by: group_by.iter().map(|c| c.to_string()).collect(),
            measure: MeasureSource::Column(measure.into()),
            reducer: Reducer::Sum,
        }
    }

    /// `measure` summed over the whole subset.
    pub fn total(name: impl Into<String>, measure: impl Into<String>) -> Self {
        AggregationSpec::sum(name, &[], measure)
    }

    /// Each of `columns` summed over the whole subset, one row per column.
    pub fn melt(name: impl Into<String>, columns: Vec<String>, key_column: impl Into<String>) -> Self {
        AggregationSpec {
            name: name.into(),
            group_by: Vec::new(),
            measure: MeasureSource::Melt {
                columns,
                key_column: key_column.into(),
            },
            reducer: Reducer::Sum,
        }
    }

    pub fn with_reducer(mut self, reducer: Reducer) -> Self {
        self.reducer = reducer;
        self
    }

    /// Scalar specs produce one number, not a table.
    pub fn is_scalar(&self) -> bool {
        self.group_by.is_empty() && matches!(self.measure, MeasureSource::Column(_))
    }

    /// Every column the aggregation reads, group-by columns first.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.group_by.iter().map(String::as_str).collect();
        match &self.measure {
            MeasureSource::Column(c) => columns.push(c),
            MeasureSource::Melt { columns: melted, .. } => {
                columns.extend(melted.iter().map(String::as_str))
            }
        }
        columns
    }
}
