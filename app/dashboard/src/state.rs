//! FILENAME: app/dashboard/src/state.rs
// PURPOSE: Process-wide state shared by every dashboard session.
// CONTEXT: The dataset and catalog are loaded once and shared read-only;
//          each session owns an independent filter cascade.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use cascade_engine::{Catalog, FilterCascade};
use chrono::{DateTime, Utc};
use dataset::Dataset;
use persistence::open_source;
use uuid::Uuid;

use crate::config::DashboardConfig;
use crate::error::AppError;
use crate::log_info;

pub type SessionId = Uuid;

/// One user's filter state.
#[derive(Debug, Clone)]
pub struct DashboardSession {
    pub cascade: FilterCascade,
    pub opened_at: DateTime<Utc>,
}

pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub catalog: Arc<Catalog>,
    pub config: DashboardConfig,
    pub sessions: Mutex<HashMap<SessionId, DashboardSession>>,
}

impl AppState {
    /// Builds state over an already-loaded dataset, validating the
    /// configured facet and catalog columns against it.
    pub fn with_dataset(config: DashboardConfig, dataset: Dataset) -> Result<Self, AppError> {
        let convention = config.columns.convention();
        let catalog = Catalog::population(dataset.schema(), &config.columns.catalog_columns(), &convention)?;
        let dataset = Arc::new(dataset);

        // Fails here, not on the first session, when a facet column is missing.
        FilterCascade::new(dataset.clone(), config.columns.facets(), config.option_order)?;

        Ok(AppState {
            dataset,
            catalog: Arc::new(catalog),
            config,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    pub fn new_session(&self) -> Result<DashboardSession, AppError> {
        let cascade = FilterCascade::new(
            self.dataset.clone(),
            self.config.columns.facets(),
            self.config.option_order,
        )?;
        Ok(DashboardSession {
            cascade,
            opened_at: Utc::now(),
        })
    }

    /// Locks the session map, recovering from poisoning.
    pub fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, DashboardSession>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }
}

/// Loads the configured source once and builds the shared state.
pub fn create_app_state(config: DashboardConfig) -> Result<AppState, AppError> {
    let source = open_source(&config.source)?;
    log_info!("SYS", "Creating AppState from {}", source.describe());
    let dataset = source.load(&config.columns.convention())?;
    log_info!(
        "SYS",
        "Loaded {} rows, {} columns",
        dataset.len(),
        dataset.schema().len()
    );
    AppState::with_dataset(config, dataset)
}
