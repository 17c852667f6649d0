//! FILENAME: core/cascade-engine/src/aggregate.rs
//! Aggregation Engine - evaluates one AggregationSpec against a FilteredSubset.
//!
//! Algorithm:
//! 1. Resolve group-by and measure columns against the dataset schema
//! 2. Scan the subset once, building a composite key of interned ids per row
//! 3. Feed the measure into the key's accumulator, creating groups on first sight
//! 4. Emit groups in first-occurrence order with the reducer applied
//!
//! Results are never cached: every call recomputes from the subset.

use dataset::{CategoryRef, ColumnKind, Dataset, MeasureRef, Schema, ValueId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::definition::{AggregationSpec, MeasureSource, Reducer};
use crate::error::EngineError;
use crate::subset::FilteredSubset;

// ============================================================================
// OUTPUT TYPES
// ============================================================================

/// One group of an aggregate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// Group key values, one per key column.
    pub key: Vec<String>,
    pub value: f64,
}

/// A grouped aggregate, ordered by first occurrence of each key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateTable {
    pub key_columns: Vec<String>,
    pub value_column: String,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of every group value.
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.value).sum()
    }

    /// Value of a single-column key, if present.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.key.len() == 1 && r.key[0] == key)
            .map(|r| r.value)
    }

    /// Value of a composite key, if present.
    pub fn get_composite(&self, key: &[&str]) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.key.iter().map(String::as_str).eq(key.iter().copied()))
            .map(|r| r.value)
    }

    /// `(key, value)` pairs for single-column keys, in table order.
    pub fn pairs(&self) -> Vec<(&str, f64)> {
        self.rows
            .iter()
            .map(|r| (r.key.first().map(String::as_str).unwrap_or(""), r.value))
            .collect()
    }
}

/// Result of evaluating one spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum AggregateOutput {
    Scalar(f64),
    Table(AggregateTable),
}

impl AggregateOutput {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            AggregateOutput::Scalar(v) => Some(*v),
            AggregateOutput::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&AggregateTable> {
        match self {
            AggregateOutput::Table(t) => Some(t),
            AggregateOutput::Scalar(_) => None,
        }
    }

    /// Table form; a scalar becomes one row with an empty key.
    pub fn into_table(self, value_column: &str) -> AggregateTable {
        match self {
            AggregateOutput::Table(t) => t,
            AggregateOutput::Scalar(value) => AggregateTable {
                key_columns: Vec::new(),
                value_column: value_column.to_string(),
                rows: vec![AggregateRow { key: Vec::new(), value }],
            },
        }
    }

    /// True for a zero scalar, an empty table, or a table of zeros.
    pub fn is_empty_or_zero(&self) -> bool {
        match self {
            AggregateOutput::Scalar(v) => *v == 0.0,
            AggregateOutput::Table(t) => t.rows.iter().all(|r| r.value == 0.0),
        }
    }
}

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Running state for every supported reducer.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Accumulator {
    sum: f64,
    count: u64,
    min: Option<f64>,
    max: Option<f64>,
}

impl Accumulator {
    pub(crate) fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Final value; an accumulator that saw nothing reduces to 0.
    pub(crate) fn compute(&self, reducer: Reducer) -> f64 {
        match reducer {
            Reducer::Sum => self.sum,
            Reducer::Count => self.count as f64,
            Reducer::Mean => {
                if self.count > 0 {
                    self.sum / self.count as f64
                } else {
                    0.0
                }
            }
            Reducer::Min => self.min.unwrap_or(0.0),
            Reducer::Max => self.max.unwrap_or(0.0),
        }
    }
}

// ============================================================================
// GROUP KEY
// ============================================================================

/// Composite key: one interned id per group-by column, plus the melted
/// measure slot (always 0 for single-column specs).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    values: SmallVec<[ValueId; 4]>,
    measure: u32,
}

// ============================================================================
// RESOLVED SPEC
// ============================================================================

/// A spec whose columns have been checked and resolved against a schema.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedSpec {
    group_by: Vec<CategoryRef>,
    measures: Vec<MeasureRef>,
    melted: bool,
}

impl ResolvedSpec {
    pub(crate) fn resolve(spec: &AggregationSpec, schema: &Schema) -> Result<Self, EngineError> {
        let group_by = spec
            .group_by
            .iter()
            .map(|column| resolve_category(schema, column))
            .collect::<Result<Vec<_>, _>>()?;

        let (measures, melted) = match &spec.measure {
            MeasureSource::Column(column) => (vec![resolve_measure(schema, column)?], false),
            MeasureSource::Melt { columns, .. } => (
                columns
                    .iter()
                    .map(|column| resolve_measure(schema, column))
                    .collect::<Result<Vec<_>, _>>()?,
                true,
            ),
        };

        Ok(ResolvedSpec {
            group_by,
            measures,
            melted,
        })
    }
}

fn resolve_category(schema: &Schema, column: &str) -> Result<CategoryRef, EngineError> {
    match schema.kind_of(column) {
        None => Err(EngineError::UnknownColumn(column.to_string())),
        Some(ColumnKind::Measure) => Err(EngineError::ColumnKind {
            column: column.to_string(),
            expected: ColumnKind::Categorical,
        }),
        Some(ColumnKind::Categorical) => schema
            .category_ref(column)
            .ok_or_else(|| EngineError::UnknownColumn(column.to_string())),
    }
}

fn resolve_measure(schema: &Schema, column: &str) -> Result<MeasureRef, EngineError> {
    match schema.kind_of(column) {
        None => Err(EngineError::UnknownColumn(column.to_string())),
        Some(ColumnKind::Categorical) => Err(EngineError::ColumnKind {
            column: column.to_string(),
            expected: ColumnKind::Measure,
        }),
        Some(ColumnKind::Measure) => schema
            .measure_ref(column)
            .ok_or_else(|| EngineError::UnknownColumn(column.to_string())),
    }
}

// ============================================================================
// EVALUATION
// ============================================================================

/// Evaluates `spec` against `subset`. Schema errors surface as
/// `UnknownColumn`/`ColumnKind`; an empty subset is not an error.
pub fn evaluate(spec: &AggregationSpec, subset: &FilteredSubset) -> Result<AggregateOutput, EngineError> {
    let resolved = ResolvedSpec::resolve(spec, subset.dataset().schema())?;
    Ok(evaluate_resolved(spec, &resolved, subset))
}

pub(crate) fn evaluate_resolved(
    spec: &AggregationSpec,
    resolved: &ResolvedSpec,
    subset: &FilteredSubset,
) -> AggregateOutput {
    let dataset = subset.dataset();

    if spec.is_scalar() {
        let measure = resolved.measures[0];
        let mut acc = Accumulator::default();
        for &row in subset.row_indices() {
            acc.add(dataset.measure_value(row, measure));
        }
        return AggregateOutput::Scalar(acc.compute(spec.reducer));
    }

    let mut index: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut groups: Vec<(GroupKey, Accumulator)> = Vec::new();

    // A melt without group-by lists every column even over zero rows,
    // matching a column-wise sum of an empty frame.
    if resolved.melted && resolved.group_by.is_empty() {
        for slot in 0..resolved.measures.len() {
            let key = GroupKey {
                values: SmallVec::new(),
                measure: slot as u32,
            };
            index.insert(key.clone(), groups.len());
            groups.push((key, Accumulator::default()));
        }
    }

    for &row in subset.row_indices() {
        let values: SmallVec<[ValueId; 4]> = resolved
            .group_by
            .iter()
            .map(|&column| dataset.category_id(row, column))
            .collect();

        for (slot, &measure) in resolved.measures.iter().enumerate() {
            let key = GroupKey {
                values: values.clone(),
                measure: slot as u32,
            };
            let position = *index.entry(key.clone()).or_insert_with(|| {
                groups.push((key, Accumulator::default()));
                groups.len() - 1
            });
            groups[position].1.add(dataset.measure_value(row, measure));
        }
    }

    AggregateOutput::Table(build_table(spec, resolved, dataset, groups))
}

fn build_table(
    spec: &AggregationSpec,
    resolved: &ResolvedSpec,
    dataset: &Dataset,
    groups: Vec<(GroupKey, Accumulator)>,
) -> AggregateTable {
    let mut key_columns = spec.group_by.clone();
    let value_column = match &spec.measure {
        MeasureSource::Column(column) => column.clone(),
        MeasureSource::Melt { key_column, .. } => {
            key_columns.push(key_column.clone());
            "value".to_string()
        }
    };

    let rows = groups
        .into_iter()
        .map(|(key, acc)| {
            let mut labels: Vec<String> = key
                .values
                .iter()
                .zip(&resolved.group_by)
                .map(|(&id, &column)| {
                    dataset
                        .category_column(column)
                        .label(id)
                        .unwrap_or("")
                        .to_string()
                })
                .collect();
            if resolved.melted {
                labels.push(dataset.measure_name(resolved.measures[key.measure as usize]).to_string());
            }
            AggregateRow {
                key: labels,
                value: acc.compute(spec.reducer),
            }
        })
        .collect();

    AggregateTable {
        key_columns,
        value_column,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataset::{MeasureConvention, Value};
    use std::sync::Arc;

    fn sales() -> FilteredSubset {
        let headers = ["region", "product", "group_all_ages", "group_18_and_up"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let row = |region: &str, product: &str, all: f64, adult: f64| {
            vec![Value::from(region), Value::from(product), Value::Number(all), Value::Number(adult)]
        };
        let rows = vec![
            row("North", "Apples", 100.0, 60.0),
            row("North", "Oranges", 150.0, 90.0),
            row("South", "Apples", 200.0, 120.0),
            row("South", "Oranges", 250.0, 150.0),
        ];
        let dataset = Dataset::from_rows(headers, rows, MeasureConvention::default()).unwrap();
        FilteredSubset::full(Arc::new(dataset))
    }

    #[test]
    fn test_group_order_is_first_occurrence() {
        let spec = AggregationSpec::sum("by_product", &["product"], "group_all_ages");
        let output = evaluate(&spec, &sales()).unwrap();
        let table = output.as_table().unwrap();
        assert_eq!(table.pairs(), vec![("Apples", 300.0), ("Oranges", 400.0)]);
    }

    #[test]
    fn test_reducers() {
        let subset = sales();
        let value = |reducer| {
            evaluate(&AggregationSpec::total("t", "group_all_ages").with_reducer(reducer), &subset)
                .unwrap()
                .as_scalar()
                .unwrap()
        };
        assert_eq!(value(Reducer::Sum), 700.0);
        assert_eq!(value(Reducer::Count), 4.0);
        assert_eq!(value(Reducer::Mean), 175.0);
        assert_eq!(value(Reducer::Min), 100.0);
        assert_eq!(value(Reducer::Max), 250.0);
    }

    #[test]
    fn test_melt_keys_by_column_name() {
        let spec = AggregationSpec::melt(
            "buckets",
            vec!["group_18_and_up".to_string(), "group_all_ages".to_string()],
            "age_group",
        );
        let output = evaluate(&spec, &sales()).unwrap();
        let table = output.as_table().unwrap();
        assert_eq!(table.key_columns, vec!["age_group".to_string()]);
        assert_eq!(table.pairs(), vec![("group_18_and_up", 420.0), ("group_all_ages", 700.0)]);
    }

    #[test]
    fn test_unknown_and_mistyped_columns() {
        let subset = sales();
        assert_eq!(
            evaluate(&AggregationSpec::sum("x", &["district"], "group_all_ages"), &subset),
            Err(EngineError::UnknownColumn("district".to_string()))
        );
        assert!(matches!(
            evaluate(&AggregationSpec::sum("x", &["group_18_and_up"], "group_all_ages"), &subset),
            Err(EngineError::ColumnKind { expected: ColumnKind::Categorical, .. })
        ));
        assert!(matches!(
            evaluate(&AggregationSpec::total("x", "region"), &subset),
            Err(EngineError::ColumnKind { expected: ColumnKind::Measure, .. })
        ));
    }
}
