//! FILENAME: app/dashboard/src/config.rs
// PURPOSE: Dashboard configuration loaded from JSON.
// CONTEXT: Every field has a default, so an empty object (or no file at all)
//          describes the stock population dashboard over a local CSV export.

use std::path::{Path, PathBuf};

use cascade_engine::{CatalogColumns, FacetSet, OptionOrder, DEFAULT_TOP_N};
use dataset::MeasureConvention;
use persistence::SourceConfig;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Names the config file when no path is passed explicitly.
pub const CONFIG_ENV_VAR: &str = "POPSTATS_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub source: SourceConfig,
    pub columns: ColumnConfig,
    pub option_order: OptionOrder,
    /// Districts kept by the top-districts breakdown.
    pub top_n: usize,
    /// Reset later selections that fall out of their options after a change.
    pub prune_stale_selections: bool,
    pub log: LogConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            source: SourceConfig::default(),
            columns: ColumnConfig::default(),
            option_order: OptionOrder::default(),
            top_n: DEFAULT_TOP_N,
            prune_stale_selections: false,
            log: LogConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Reads `path`, else the file named by `POPSTATS_CONFIG`, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from),
        };
        match path {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, AppError> {
        let config: DashboardConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.top_n == 0 {
            return Err(AppError::Config("top_n must be at least 1".to_string()));
        }
        self.log.level_filter()?;
        Ok(())
    }
}

/// Column names of the population table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub province: String,
    pub district: String,
    pub area_type: String,
    pub gender: String,
    pub measure_prefix: String,
    pub total_measure: String,
    pub adult_measure: String,
    pub senior_measure: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        let catalog = CatalogColumns::default();
        ColumnConfig {
            province: catalog.province,
            district: catalog.district,
            area_type: catalog.area_type,
            gender: catalog.gender,
            measure_prefix: MeasureConvention::default().prefix,
            total_measure: catalog.total_measure,
            adult_measure: catalog.adult_measure,
            senior_measure: catalog.senior_measure,
        }
    }
}

impl ColumnConfig {
    pub fn convention(&self) -> MeasureConvention {
        MeasureConvention::new(self.measure_prefix.clone(), self.total_measure.clone())
    }

    /// Province -> District -> Area Type -> Gender over the configured columns.
    pub fn facets(&self) -> FacetSet {
        FacetSet::population(&self.province, &self.district, &self.area_type, &self.gender)
    }

    pub fn catalog_columns(&self) -> CatalogColumns {
        CatalogColumns {
            province: self.province.clone(),
            district: self.district.clone(),
            area_type: self.area_type.clone(),
            gender: self.gender.clone(),
            total_measure: self.total_measure.clone(),
            adult_measure: self.adult_measure.clone(),
            senior_measure: self.senior_measure.clone(),
            ..CatalogColumns::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `error`, `warn`, `info`, `debug`, `trace` or `off`.
    pub level: String,
    /// Unified log file, truncated on start.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LogConfig {
    pub fn level_filter(&self) -> Result<log::LevelFilter, AppError> {
        self.level
            .parse()
            .map_err(|_| AppError::Config(format!("unknown log level: {}", self.level)))
    }
}
