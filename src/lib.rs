mod app;
mod autosave;
mod csv_import;
mod dates;
mod db;
mod errors;
mod form;
mod models;
mod persistence;
mod store;
mod validation;

pub use crate::app::ServiceLogApp;
pub use crate::autosave::{Autosaver, CommitFn, SaveTicket};
pub use crate::csv_import::{parse_service_logs_csv, split_csv_line, CsvParseResult, CSV_TEMPLATE};
pub use crate::dates::{add_days, default_dates, parse_date_input, sync_end_date, to_date_input_value, today, DefaultDates};
pub use crate::db::Database;
pub use crate::errors::{AppError, AppResult};
pub use crate::form::{EditServiceLogDialog, FieldChange, ServiceLogForm};
pub use crate::models::{
    AppSettings, Draft, DraftsSnapshot, ImportOutcome, PersistedSnapshot, SaveStatus, ServiceLog,
    ServiceLogFilters, ServiceLogFormValues, ServiceLogsSnapshot, ServiceType, ServiceTypeFilter,
};
pub use crate::persistence::{BlobStore, MemoryBlobStore, SnapshotPersistor};
pub use crate::store::{filter_logs, AppState, DraftsState, ServiceLogsState, SNAPSHOT_VERSION};
pub use crate::validation::{
    default_form_values, validate_form_values, FieldError, FormField, ValidationErrors, MIN_DESCRIPTION_CHARS,
};

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Installs a JSON subscriber writing to `<data_dir>/logs/service-log.log`, rotated daily.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(data_dir: &Path) -> Result<(), String> {
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "service-log.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())?;

    let _ = LOG_GUARD.set(guard);
    Ok(())
}
