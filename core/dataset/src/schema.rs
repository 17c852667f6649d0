//! FILENAME: core/dataset/src/schema.rs
//! PURPOSE: Column definitions and the measure naming convention.

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

/// Index of a column within the schema (0-based, source order).
pub type ColumnIndex = usize;

/// Resolved position of a categorical column (index among categorical columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryRef(pub usize);

/// Resolved position of a measure column (index among measure columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasureRef(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Opaque string attribute (province, district, gender, ...).
    Categorical,
    /// Non-negative numeric count intended for summation.
    Measure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
}

// ============================================================================
// MEASURE CONVENTION
// ============================================================================

/// Decides which columns are measures from their names alone.
///
/// The dataset carries one total measure plus a set of age-bucket partitions
/// of it. Buckets overlap (`group_18_and_up` contains `group_60_and_up`), so
/// nothing downstream may add measure columns together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureConvention {
    /// Column-name prefix that tags a measure column.
    pub prefix: String,
    /// The measure covering every age group.
    pub total_column: String,
}

impl Default for MeasureConvention {
    fn default() -> Self {
        MeasureConvention {
            prefix: "group_".to_string(),
            total_column: "group_all_ages".to_string(),
        }
    }
}

impl MeasureConvention {
    pub fn new(prefix: impl Into<String>, total_column: impl Into<String>) -> Self {
        MeasureConvention {
            prefix: prefix.into(),
            total_column: total_column.into(),
        }
    }

    pub fn is_measure(&self, column: &str) -> bool {
        column.starts_with(&self.prefix) || column == self.total_column
    }

    pub fn classify(&self, column: &str) -> ColumnKind {
        if self.is_measure(column) {
            ColumnKind::Measure
        } else {
            ColumnKind::Categorical
        }
    }

    /// Measure columns other than the total, in schema order.
    pub fn bucket_columns(&self, schema: &Schema) -> Vec<String> {
        schema
            .measure_columns()
            .filter(|c| c.name != self.total_column)
            .map(|c| c.name.clone())
            .collect()
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self, DatasetError> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(DatasetError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Schema { columns })
    }

    /// Builds a schema by classifying each header with the convention.
    pub fn from_headers(headers: &[String], convention: &MeasureConvention) -> Result<Self, DatasetError> {
        let columns = headers
            .iter()
            .map(|name| ColumnDef {
                name: name.clone(),
                kind: convention.classify(name),
            })
            .collect();
        Schema::new(columns)
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<ColumnIndex> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.get(name).map(|c| c.kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Resolves a categorical column. `None` if absent or a measure.
    pub fn category_ref(&self, name: &str) -> Option<CategoryRef> {
        let index = self.index_of(name)?;
        if self.columns[index].kind != ColumnKind::Categorical {
            return None;
        }
        let pos = self.columns[..index]
            .iter()
            .filter(|c| c.kind == ColumnKind::Categorical)
            .count();
        Some(CategoryRef(pos))
    }

    /// Resolves a measure column. `None` if absent or categorical.
    pub fn measure_ref(&self, name: &str) -> Option<MeasureRef> {
        let index = self.index_of(name)?;
        if self.columns[index].kind != ColumnKind::Measure {
            return None;
        }
        let pos = self.columns[..index]
            .iter()
            .filter(|c| c.kind == ColumnKind::Measure)
            .count();
        Some(MeasureRef(pos))
    }

    pub fn categorical_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.kind == ColumnKind::Categorical)
    }

    pub fn measure_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.kind == ColumnKind::Measure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn convention_tags_prefixed_columns() {
        let convention = MeasureConvention::default();
        assert_eq!(convention.classify("group_0_4"), ColumnKind::Measure);
        assert_eq!(convention.classify("group_all_ages"), ColumnKind::Measure);
        assert_eq!(convention.classify("district_name"), ColumnKind::Categorical);
        // The prefix check is case-sensitive like every other name comparison.
        assert_eq!(convention.classify("Group_0_4"), ColumnKind::Categorical);
    }

    #[test]
    fn bucket_columns_exclude_total_and_keep_order() {
        let convention = MeasureConvention::default();
        let schema = Schema::from_headers(
            &names(&["province_name", "group_all_ages", "group_18_and_up", "gender", "group_60_and_up"]),
            &convention,
        )
        .unwrap();
        assert_eq!(
            convention.bucket_columns(&schema),
            names(&["group_18_and_up", "group_60_and_up"])
        );
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let result = Schema::from_headers(&names(&["gender", "gender"]), &MeasureConvention::default());
        assert!(matches!(result, Err(DatasetError::DuplicateColumn(name)) if name == "gender"));
    }
}
