//! FILENAME: app/dashboard/src/logging.rs
// PURPOSE: Unified logging system for the dashboard.
// CONTEXT: Installed as the `log` backend, so lines from the core crates
//          (targets DATASET, CASCADE, CATALOG, SOURCE, EXPORT) and from the
//          app macros share one sequence and one format.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use log::{Level, Log, Metadata, Record};
use once_cell::sync::Lazy;

use crate::config::LogConfig;
use crate::error::AppError;

// ============================================================================
// UNIFIED LOGGING SYSTEM
// ============================================================================

/// Global sequence counter
static LOG_SEQ: AtomicU64 = AtomicU64::new(0);

/// Global log file handle
pub static LOG_FILE: Lazy<Mutex<Option<File>>> = Lazy::new(|| Mutex::new(None));

static LOGGER: UnifiedLogger = UnifiedLogger;

/// Get next sequence number
pub fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst) + 1
}

/// `seq|level|category|message`
pub fn format_line(seq: u64, level: &str, category: &str, message: &str) -> String {
    format!("{}|{}|{}|{}", seq, level, category, message)
}

pub fn level_code(level: Level) -> &'static str {
    match level {
        Level::Error => "E",
        Level::Warn => "W",
        Level::Info => "I",
        Level::Debug => "D",
        Level::Trace => "T",
    }
}

/// Opens (truncating) the unified log file.
pub fn init_log_file(path: &Path) -> Result<(), AppError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    let mut guard = LOG_FILE.lock().unwrap_or_else(|e| e.into_inner());
    *guard = Some(file);
    Ok(())
}

/// Write a log line in unified format. Console output goes to stderr so
/// stdout stays clean for command output.
pub fn write_log(level: &str, category: &str, message: &str) {
    let line = format_line(next_seq(), level, category, message);

    let mut guard = LOG_FILE.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(ref mut file) = *guard {
        if let Err(e) = writeln!(file, "{}", line) {
            eprintln!("[LOG_ERROR] Failed to write: {}", e);
        }
        let _ = file.flush();
    }
    drop(guard);

    eprintln!("{}", line);
}

struct UnifiedLogger;

impl Log for UnifiedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            write_log(level_code(record.level()), record.target(), &record.args().to_string());
        }
    }

    fn flush(&self) {
        let mut guard = LOG_FILE.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(ref mut file) = *guard {
            let _ = file.flush();
        }
    }
}

/// Installs the unified backend at `config.level`. Installing twice only
/// updates the level.
pub fn init_logging(config: &LogConfig) -> Result<(), AppError> {
    let level = config.level_filter()?;
    if let Some(path) = &config.file {
        init_log_file(path)?;
    }
    // set_logger fails once a backend is installed; the level still applies.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
    Ok(())
}

// ============================================================================
// MACRO DEFINITIONS & EXPORTS
// ============================================================================

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        ::log::debug!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        ::log::info!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        ::log::warn!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($cat:expr, $($arg:tt)*) => {
        ::log::error!(target: $cat, $($arg)*)
    };
}

pub use log_debug;
pub use log_error;
pub use log_info;
pub use log_warn;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_format() {
        assert_eq!(format_line(7, "I", "SESSION", "opened"), "7|I|SESSION|opened");
        assert_eq!(level_code(Level::Warn), "W");
    }

    #[test]
    fn test_sequence_is_increasing() {
        let a = next_seq();
        let b = next_seq();
        assert!(b > a);
    }

    #[test]
    fn test_unknown_level_is_config_error() {
        let config = LogConfig {
            level: "chatty".to_string(),
            file: None,
        };
        assert!(matches!(init_logging(&config), Err(AppError::Config(_))));
    }
}
