//! FILENAME: core/cascade-engine/src/catalog.rs
//! The fixed battery of dashboard aggregations.
//!
//! A catalog is validated once, at construction: every referenced column
//! must exist with the right kind, otherwise construction fails. After that
//! evaluation is total over any subset of a dataset with the same schema.

use dataset::{MeasureConvention, Schema};
use serde::{Deserialize, Serialize};

use crate::aggregate::{evaluate_resolved, AggregateOutput, ResolvedSpec};
use crate::definition::AggregationSpec;
use crate::error::EngineError;
use crate::subset::FilteredSubset;

/// Column names the population catalog is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogColumns {
    pub province: String,
    pub district: String,
    pub area_type: String,
    pub gender: String,
    pub total_measure: String,
    pub adult_measure: String,
    pub senior_measure: String,
    /// Key column name of the melted age-group table.
    pub age_group_key: String,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        CatalogColumns {
            province: "province_name".to_string(),
            district: "district_name".to_string(),
            area_type: "area_type".to_string(),
            gender: "gender".to_string(),
            total_measure: "group_all_ages".to_string(),
            adult_measure: "group_18_and_up".to_string(),
            senior_measure: "group_60_and_up".to_string(),
            age_group_key: "age_group".to_string(),
        }
    }
}

/// One evaluated catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedAggregate {
    pub name: String,
    pub output: AggregateOutput,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    schema: Schema,
    specs: Vec<AggregationSpec>,
    resolved: Vec<ResolvedSpec>,
}

impl Catalog {
    /// Validates every spec against `schema`; fails on the first bad column.
    pub fn new(schema: &Schema, specs: Vec<AggregationSpec>) -> Result<Self, EngineError> {
        let resolved = specs
            .iter()
            .map(|spec| ResolvedSpec::resolve(spec, schema))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Catalog {
            schema: schema.clone(),
            specs,
            resolved,
        })
    }

    /// The ten population summaries, in display order.
    pub fn population(
        schema: &Schema,
        columns: &CatalogColumns,
        convention: &MeasureConvention,
    ) -> Result<Self, EngineError> {
        let c = columns;
        let specs = vec![
            AggregationSpec::total("total_population", &c.total_measure),
            AggregationSpec::sum("gender_distribution", &[c.gender.as_str()], &c.total_measure),
            AggregationSpec::sum("population_by_province", &[c.province.as_str()], &c.total_measure),
            AggregationSpec::melt(
                "age_group_distribution",
                convention.bucket_columns(schema),
                &c.age_group_key,
            ),
            AggregationSpec::sum("population_by_area_type", &[c.area_type.as_str()], &c.total_measure),
            AggregationSpec::sum("senior_population_by_province", &[c.province.as_str()], &c.senior_measure),
            AggregationSpec::total("total_adult_population", &c.adult_measure),
            AggregationSpec::sum("adult_population_by_gender", &[c.gender.as_str()], &c.adult_measure),
            AggregationSpec::sum("adult_population_by_province", &[c.province.as_str()], &c.adult_measure),
            AggregationSpec::sum(
                "adult_population_by_province_gender",
                &[c.province.as_str(), c.gender.as_str()],
                &c.adult_measure,
            ),
        ];
        Catalog::new(schema, specs)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn specs(&self) -> &[AggregationSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&AggregationSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    /// Evaluates one named spec.
    pub fn evaluate(&self, name: &str, subset: &FilteredSubset) -> Option<Result<AggregateOutput, EngineError>> {
        let position = self.specs.iter().position(|s| s.name == name)?;
        Some(
            self.check_schema(subset)
                .map(|()| evaluate_resolved(&self.specs[position], &self.resolved[position], subset)),
        )
    }

    /// Evaluates every spec, in catalog order.
    pub fn evaluate_all(&self, subset: &FilteredSubset) -> Result<Vec<NamedAggregate>, EngineError> {
        self.check_schema(subset)?;
        let results = self
            .specs
            .iter()
            .zip(&self.resolved)
            .map(|(spec, resolved)| NamedAggregate {
                name: spec.name.clone(),
                output: evaluate_resolved(spec, resolved, subset),
            })
            .collect();
        log::debug!(
            target: "CATALOG",
            "evaluated {} aggregates over {} rows",
            self.specs.len(),
            subset.len()
        );
        Ok(results)
    }

    fn check_schema(&self, subset: &FilteredSubset) -> Result<(), EngineError> {
        if subset.dataset().schema() == &self.schema {
            Ok(())
        } else {
            Err(EngineError::SchemaMismatch)
        }
    }
}
