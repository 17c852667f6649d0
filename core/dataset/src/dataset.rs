//! FILENAME: core/dataset/src/dataset.rs
//! PURPOSE: The immutable in-memory dataset and its builder.
//! CONTEXT: Rows are stored as interned category ids plus measure values.
//! Once `DatasetBuilder::finish` returns, nothing mutates the dataset, so it
//! can be shared by reference across every dashboard session.

use crate::column::{CategoryColumn, ValueId};
use crate::error::DatasetError;
use crate::schema::{CategoryRef, ColumnKind, MeasureConvention, MeasureRef, Schema};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Category(usize),
    Measure(usize),
}

// ============================================================================
// RECORD
// ============================================================================

/// A single source row stored as interned ids and measure values.
#[derive(Debug, Clone)]
struct Record {
    /// ValueIds for each categorical column, indexed by `CategoryRef`.
    categories: Vec<ValueId>,

    /// Values for each measure column, indexed by `MeasureRef`.
    measures: Vec<f64>,
}

// ============================================================================
// DATASET
// ============================================================================

#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Schema,
    convention: MeasureConvention,
    slots: Vec<Slot>,
    categories: Vec<CategoryColumn>,
    measure_names: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn convention(&self) -> &MeasureConvention {
        &self.convention
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        if index < self.records.len() {
            Some(RowRef { dataset: self, index })
        } else {
            None
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        (0..self.records.len()).map(move |index| RowRef { dataset: self, index })
    }

    pub fn category_ref(&self, name: &str) -> Option<CategoryRef> {
        self.schema.category_ref(name)
    }

    pub fn measure_ref(&self, name: &str) -> Option<MeasureRef> {
        self.schema.measure_ref(name)
    }

    pub fn category_column(&self, column: CategoryRef) -> &CategoryColumn {
        &self.categories[column.0]
    }

    pub fn measure_name(&self, measure: MeasureRef) -> &str {
        &self.measure_names[measure.0]
    }

    #[inline]
    pub fn category_id(&self, row: usize, column: CategoryRef) -> ValueId {
        self.records[row].categories[column.0]
    }

    #[inline]
    pub fn category_label(&self, row: usize, column: CategoryRef) -> &str {
        let id = self.category_id(row, column);
        self.categories[column.0].label(id).unwrap_or("")
    }

    #[inline]
    pub fn measure_value(&self, row: usize, measure: MeasureRef) -> f64 {
        self.records[row].measures[measure.0]
    }
}

/// Borrowed view of one dataset row.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    dataset: &'a Dataset,
    index: usize,
}

impl<'a> RowRef<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn category(&self, name: &str) -> Option<&'a str> {
        let column = self.dataset.category_ref(name)?;
        Some(self.dataset.category_label(self.index, column))
    }

    pub fn measure(&self, name: &str) -> Option<f64> {
        let measure = self.dataset.measure_ref(name)?;
        Some(self.dataset.measure_value(self.index, measure))
    }

    /// Cells in schema order, for tabular display.
    pub fn values(&self) -> Vec<Value> {
        self.dataset
            .slots
            .iter()
            .map(|slot| match *slot {
                Slot::Category(pos) => {
                    Value::Text(self.dataset.category_label(self.index, CategoryRef(pos)).to_string())
                }
                Slot::Measure(pos) => Value::Number(self.dataset.measure_value(self.index, MeasureRef(pos))),
            })
            .collect()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Accumulates source rows and validates them against the schema.
pub struct DatasetBuilder {
    schema: Schema,
    convention: MeasureConvention,
    slots: Vec<Slot>,
    categories: Vec<CategoryColumn>,
    measure_names: Vec<String>,
    records: Vec<Record>,
}

impl DatasetBuilder {
    pub fn new(headers: Vec<String>, convention: MeasureConvention) -> Result<Self, DatasetError> {
        let schema = Schema::from_headers(&headers, &convention)?;
        if !schema.contains(&convention.total_column) {
            return Err(DatasetError::MissingTotalMeasure(convention.total_column.clone()));
        }

        let mut slots = Vec::with_capacity(schema.len());
        let mut categories = Vec::new();
        let mut measure_names = Vec::new();
        for column in schema.columns() {
            match column.kind {
                ColumnKind::Categorical => {
                    slots.push(Slot::Category(categories.len()));
                    categories.push(CategoryColumn::new(column.name.clone()));
                }
                ColumnKind::Measure => {
                    slots.push(Slot::Measure(measure_names.len()));
                    measure_names.push(column.name.clone());
                }
            }
        }

        Ok(DatasetBuilder {
            schema,
            convention,
            slots,
            categories,
            measure_names,
            records: Vec::new(),
        })
    }

    /// Reserves capacity for expected row count.
    pub fn reserve(&mut self, rows: usize) {
        self.records.reserve(rows);
    }

    /// Adds a row. Values must be in header order.
    pub fn push_row(&mut self, values: Vec<Value>) -> Result<(), DatasetError> {
        let row = self.records.len();
        if values.len() != self.slots.len() {
            return Err(DatasetError::RowWidth {
                row,
                expected: self.slots.len(),
                actual: values.len(),
            });
        }

        let mut categories = Vec::with_capacity(self.categories.len());
        let mut measures = Vec::with_capacity(self.measure_names.len());

        for (slot, value) in self.slots.iter().zip(values) {
            match *slot {
                Slot::Category(pos) => {
                    let id = self.categories[pos].intern(value.into_category());
                    categories.push(id);
                }
                Slot::Measure(pos) => match value.as_measure() {
                    Some(n) if n.is_finite() && n >= 0.0 => measures.push(n),
                    _ => {
                        return Err(DatasetError::InvalidMeasure {
                            row,
                            column: self.measure_names[pos].clone(),
                            value: value.to_string(),
                        });
                    }
                },
            }
        }

        self.records.push(Record {
            categories,
            measures,
        });
        Ok(())
    }

    pub fn finish(mut self) -> Result<Dataset, DatasetError> {
        for column in self.categories.iter_mut() {
            column.seal();
        }

        log::debug!(
            target: "DATASET",
            "built dataset rows={} categories={} measures={}",
            self.records.len(),
            self.categories.len(),
            self.measure_names.len()
        );

        Ok(Dataset {
            schema: self.schema,
            convention: self.convention,
            slots: self.slots,
            categories: self.categories,
            measure_names: self.measure_names,
            records: self.records,
        })
    }
}

impl Dataset {
    /// Convenience constructor for in-memory rows.
    pub fn from_rows(
        headers: Vec<String>,
        rows: Vec<Vec<Value>>,
        convention: MeasureConvention,
    ) -> Result<Dataset, DatasetError> {
        let mut builder = DatasetBuilder::new(headers, convention)?;
        builder.reserve(rows.len());
        for row in rows {
            builder.push_row(row)?;
        }
        builder.finish()
    }
}
