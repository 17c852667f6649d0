//! FILENAME: core/cascade-engine/src/cascade.rs
//! Filter Cascade - ordered facet selections and their dependent option lists.
//!
//! The options of facet `k` are derived from the rows left by facets
//! `0..k` only. Selections on later facets never influence earlier option
//! lists, which is what makes this a one-directional cascade rather than a
//! full cross-filter.
//!
//! `set_selection` does not touch later facets. A later selection that no
//! longer appears in its options simply matches no rows; callers that want
//! the reset-to-All behavior invoke `prune_stale` explicitly.

use std::sync::Arc;

use dataset::{CategoryRef, ColumnKind, Dataset};

use crate::definition::{Facet, FacetSet, OptionOrder, Selection, ALL_LABEL};
use crate::error::EngineError;
use crate::subset::FilteredSubset;

/// A facet with its column resolved against the dataset schema.
#[derive(Debug, Clone)]
struct ResolvedFacet {
    facet: Facet,
    column: CategoryRef,
}

/// Session-scoped filter state over a shared, read-only dataset.
#[derive(Debug, Clone)]
pub struct FilterCascade {
    dataset: Arc<Dataset>,
    facets: Vec<ResolvedFacet>,
    selections: Vec<Selection>,
    order: OptionOrder,
}

impl FilterCascade {
    /// Creates a cascade with every selection set to `All`.
    pub fn new(dataset: Arc<Dataset>, facets: FacetSet, order: OptionOrder) -> Result<Self, EngineError> {
        let mut resolved = Vec::with_capacity(facets.len());
        for facet in facets.facets {
            let column = match dataset.schema().kind_of(&facet.column) {
                None => return Err(EngineError::UnknownColumn(facet.column.clone())),
                Some(ColumnKind::Measure) => {
                    return Err(EngineError::ColumnKind {
                        column: facet.column.clone(),
                        expected: ColumnKind::Categorical,
                    })
                }
                Some(ColumnKind::Categorical) => dataset
                    .category_ref(&facet.column)
                    .ok_or_else(|| EngineError::UnknownColumn(facet.column.clone()))?,
            };
            resolved.push(ResolvedFacet { facet, column });
        }

        let selections = vec![Selection::All; resolved.len()];
        Ok(FilterCascade {
            dataset,
            facets: resolved,
            selections,
            order,
        })
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn option_order(&self) -> OptionOrder {
        self.order
    }

    pub fn facet_count(&self) -> usize {
        self.facets.len()
    }

    pub fn facet(&self, index: usize) -> Result<&Facet, EngineError> {
        self.facets
            .get(index)
            .map(|f| &f.facet)
            .ok_or(EngineError::FacetOutOfRange(index))
    }

    pub fn facets(&self) -> impl Iterator<Item = &Facet> {
        self.facets.iter().map(|f| &f.facet)
    }

    /// Finds a facet by display label or column name.
    pub fn facet_index(&self, name: &str) -> Result<usize, EngineError> {
        self.facets
            .iter()
            .position(|f| f.facet.answers_to(name))
            .ok_or_else(|| EngineError::UnknownFacet(name.to_string()))
    }

    pub fn selection(&self, index: usize) -> Result<&Selection, EngineError> {
        self.selections
            .get(index)
            .ok_or(EngineError::FacetOutOfRange(index))
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    // ========================================================================
    // OPTIONS
    // ========================================================================

    /// `["All"]` followed by the distinct values of the facet's column over
    /// the rows selected by facets `0..index`.
    pub fn options_for(&self, index: usize) -> Result<Vec<String>, EngineError> {
        self.check_index(index)?;
        let rows = self.matching_rows(&self.selections[..index]);
        Ok(self.options_from_rows(index, &rows))
    }

    /// Rows selected by facets `0..index` (the base of facet `index`'s options).
    pub fn subset_before(&self, index: usize) -> Result<FilteredSubset, EngineError> {
        self.check_index(index)?;
        let rows = self.matching_rows(&self.selections[..index]);
        Ok(FilteredSubset::from_rows(self.dataset.clone(), rows))
    }

    fn options_from_rows(&self, index: usize, rows: &[usize]) -> Vec<String> {
        let column = self.facets[index].column;
        let store = self.dataset.category_column(column);

        let mut seen = vec![false; store.unique_count()];
        let mut first_seen = Vec::new();
        for &row in rows {
            let id = self.dataset.category_id(row, column);
            if !seen[id as usize] {
                seen[id as usize] = true;
                first_seen.push(id);
            }
        }

        let ids: Vec<_> = match self.order {
            OptionOrder::SourceOrder => first_seen,
            OptionOrder::Sorted => store
                .sorted_ids()
                .iter()
                .copied()
                .filter(|&id| seen[id as usize])
                .collect(),
        };

        let mut options = Vec::with_capacity(ids.len() + 1);
        options.push(ALL_LABEL.to_string());
        options.extend(ids.into_iter().filter_map(|id| store.label(id)).map(str::to_string));
        options
    }

    /// Whether `value` appears in facet `index`'s options under `selections`.
    fn offers(&self, index: usize, selections: &[Selection], value: &str) -> bool {
        let column = self.facets[index].column;
        let Some(id) = self.dataset.category_column(column).lookup(value) else {
            return false;
        };
        self.matching_rows(&selections[..index])
            .iter()
            .any(|&row| self.dataset.category_id(row, column) == id)
    }

    // ========================================================================
    // SELECTIONS
    // ========================================================================

    /// Sets facet `index`. Fails with `InvalidSelection` when the value is not
    /// in `options_for(index)`. Later facets keep their selections.
    pub fn set_selection(&mut self, index: usize, selection: Selection) -> Result<(), EngineError> {
        self.check_index(index)?;
        if let Selection::Value(value) = &selection {
            if !self.offers(index, &self.selections, value) {
                return Err(EngineError::InvalidSelection {
                    facet: self.facets[index].facet.label.clone(),
                    value: value.clone(),
                });
            }
        }

        log::debug!(
            target: "CASCADE",
            "set_selection facet={} value={}",
            self.facets[index].facet.label,
            selection.label()
        );
        self.selections[index] = selection;
        Ok(())
    }

    /// Sets a facet addressed by label or column name from a widget label.
    /// Returns the facet index.
    pub fn set_selection_by_label(&mut self, facet: &str, label: &str) -> Result<usize, EngineError> {
        let index = self.facet_index(facet)?;
        self.set_selection(index, Selection::from_label(label))?;
        Ok(index)
    }

    pub fn clear(&mut self, index: usize) -> Result<(), EngineError> {
        self.check_index(index)?;
        self.selections[index] = Selection::All;
        Ok(())
    }

    /// Every selection back to `All`.
    pub fn reset(&mut self) {
        for selection in self.selections.iter_mut() {
            *selection = Selection::All;
        }
    }

    /// Facets whose selection is not in the options derived from the current
    /// earlier selections.
    pub fn stale_facets(&self) -> Vec<usize> {
        (0..self.facets.len())
            .filter(|&index| match &self.selections[index] {
                Selection::All => false,
                Selection::Value(value) => !self.offers(index, &self.selections, value),
            })
            .collect()
    }

    /// Resets stale selections to `All`, walking facets in order so a reset
    /// on an earlier facet is visible when checking the later ones.
    /// Returns the indexes that were reset.
    pub fn prune_stale(&mut self) -> Vec<usize> {
        let mut reset = Vec::new();
        for index in 0..self.facets.len() {
            let stale = match &self.selections[index] {
                Selection::All => false,
                Selection::Value(value) => !self.offers(index, &self.selections, value),
            };
            if stale {
                self.selections[index] = Selection::All;
                reset.push(index);
            }
        }
        if !reset.is_empty() {
            log::debug!(target: "CASCADE", "pruned stale selections {:?}", reset);
        }
        reset
    }

    // ========================================================================
    // SUBSET
    // ========================================================================

    /// Applies every selection conjunctively. All-`All` yields the full
    /// dataset; an unsatisfiable combination yields an empty subset.
    pub fn current_subset(&self) -> FilteredSubset {
        let rows = self.matching_rows(&self.selections);
        log::debug!(
            target: "CASCADE",
            "current_subset rows={} of {}",
            rows.len(),
            self.dataset.len()
        );
        FilteredSubset::from_rows(self.dataset.clone(), rows)
    }

    /// Rows satisfying every non-`All` selection in `selections`
    /// (paired with facets by position).
    fn matching_rows(&self, selections: &[Selection]) -> Vec<usize> {
        let mut constraints = Vec::with_capacity(selections.len());
        for (facet, selection) in self.facets.iter().zip(selections) {
            if let Selection::Value(value) = selection {
                match self.dataset.category_column(facet.column).lookup(value) {
                    Some(id) => constraints.push((facet.column, id)),
                    // A label absent from the dataset can match nothing.
                    None => return Vec::new(),
                }
            }
        }

        (0..self.dataset.len())
            .filter(|&row| {
                constraints
                    .iter()
                    .all(|&(column, id)| self.dataset.category_id(row, column) == id)
            })
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<(), EngineError> {
        if index < self.facets.len() {
            Ok(())
        } else {
            Err(EngineError::FacetOutOfRange(index))
        }
    }
}
