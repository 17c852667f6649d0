//! FILENAME: app/dashboard/src/error.rs

use cascade_engine::EngineError;
use persistence::PersistenceError;
use thiserror::Error;

use crate::state::SessionId;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// The rejected selection, when this error is one.
    pub fn invalid_selection(&self) -> Option<(&str, &str)> {
        match self {
            AppError::Engine(EngineError::InvalidSelection { facet, value }) => Some((facet.as_str(), value.as_str())),
            _ => None,
        }
    }
}
