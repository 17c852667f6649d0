//! FILENAME: app/dashboard/src/lib.rs
// PURPOSE: Main library entry point for the population dashboard.
// CONTEXT: Wires the data source, the shared catalog and per-session filter
//          cascades together behind plain command functions.

pub mod api_types;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod render;
pub mod state;

pub use api_types::{AppliedFilter, DashboardReport, FilterPanel, FilterWidget, RowsView};
pub use commands::{
    apply_selections, close_session, filtered_rows, get_filter_panel, open_session, render_report,
    reset_filters, select,
};
pub use config::{ColumnConfig, DashboardConfig, LogConfig, CONFIG_ENV_VAR};
pub use error::AppError;
pub use logging::{init_log_file, init_logging, next_seq, write_log};
pub use state::{create_app_state, AppState, DashboardSession, SessionId};
