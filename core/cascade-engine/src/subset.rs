//! FILENAME: core/cascade-engine/src/subset.rs
//! The FilteredSubset: a fresh, read-only view of the rows that satisfy the
//! current selections. It never copies rows and is never mutated in place;
//! narrowing it produces a new subset.

use std::sync::Arc;

use dataset::{Dataset, RowRef, ValueId};
use rustc_hash::FxHashSet;

use crate::error::EngineError;

#[derive(Debug, Clone)]
pub struct FilteredSubset {
    dataset: Arc<Dataset>,
    /// Dataset row indexes in source order.
    rows: Vec<usize>,
}

impl FilteredSubset {
    /// The whole dataset (every selection `All`).
    pub fn full(dataset: Arc<Dataset>) -> Self {
        let rows = (0..dataset.len()).collect();
        FilteredSubset { dataset, rows }
    }

    pub(crate) fn from_rows(dataset: Arc<Dataset>, rows: Vec<usize>) -> Self {
        FilteredSubset { dataset, rows }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().filter_map(move |&i| self.dataset.row(i))
    }

    /// Sum of one measure column over every row in the subset.
    pub fn sum(&self, measure: &str) -> Result<f64, EngineError> {
        let measure_ref = self
            .dataset
            .measure_ref(measure)
            .ok_or_else(|| EngineError::UnknownColumn(measure.to_string()))?;
        Ok(self
            .rows
            .iter()
            .map(|&row| self.dataset.measure_value(row, measure_ref))
            .sum())
    }

    /// Keeps the rows whose `column` label is one of `keys`.
    /// Keys absent from the dataset simply match nothing.
    pub fn restrict(&self, column: &str, keys: &[String]) -> Result<FilteredSubset, EngineError> {
        let column_ref = self
            .dataset
            .category_ref(column)
            .ok_or_else(|| EngineError::UnknownColumn(column.to_string()))?;
        let store = self.dataset.category_column(column_ref);
        let wanted: FxHashSet<ValueId> = keys.iter().filter_map(|k| store.lookup(k)).collect();

        let rows = self
            .rows
            .iter()
            .copied()
            .filter(|&row| wanted.contains(&self.dataset.category_id(row, column_ref)))
            .collect();
        Ok(FilteredSubset::from_rows(self.dataset.clone(), rows))
    }
}
