//! Process-wide logging bootstrap.
//!
//! # Invariants
//! - The backend starts at most once per process.
//! - Repeating the same configuration is a no-op; a different one is refused.
//! - Initialization never panics.

use crate::error::AppError;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "taskpad";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    log_dir: Option<PathBuf>,
    _logger: LoggerHandle,
}

/// Starts logging at `level`, to rotating files in `log_dir` when given and
/// to stderr otherwise.
///
/// # Errors
/// - `invalid_input` for an unknown level, a relative `log_dir`, or a
///   configuration that conflicts with the active one.
/// - `io_error` when the directory or the backend cannot be set up.
pub fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<(), AppError> {
    let level = normalize_level(level)?;
    let log_dir = log_dir.map(normalize_log_dir).transpose()?;

    let state = LOGGING_STATE.get_or_try_init(|| start_backend(level, log_dir.clone()))?;

    if state.level != level || state.log_dir != log_dir {
        return Err(AppError::invalid_input(format!(
            "logging already initialized with level `{}` at {}; refusing to switch",
            state.level,
            describe_destination(state.log_dir.as_deref())
        )));
    }

    Ok(())
}

/// Returns `(level, log_dir)` once logging is active.
pub fn logging_status() -> Option<(&'static str, Option<PathBuf>)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.log_dir.clone()))
}

fn start_backend(level: &'static str, log_dir: Option<PathBuf>) -> Result<LoggingState, AppError> {
    let logger = Logger::try_with_str(level)
        .map_err(|err| AppError::invalid_input(format!("invalid log level `{level}`: {err}")))?;

    let logger = match log_dir.as_deref() {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| {
                AppError::io(format!(
                    "failed to create log directory `{}`: {err}",
                    dir.display()
                ))
            })?;
            logger
                .log_to_file(FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME))
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
                .start()
        }
        None => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::default_format)
            .start(),
    }
    .map_err(|err| AppError::io(format!("failed to start logger: {err}")))?;

    info!(
        "event=logging_init module=core status=ok level={} destination={} version={}",
        level,
        describe_destination(log_dir.as_deref()),
        env!("CARGO_PKG_VERSION")
    );

    Ok(LoggingState {
        level,
        log_dir,
        _logger: logger,
    })
}

fn describe_destination(log_dir: Option<&Path>) -> String {
    match log_dir {
        Some(dir) => dir.display().to_string(),
        None => "stderr".to_string(),
    }
}

fn normalize_level(level: &str) -> Result<&'static str, AppError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => Ok("off"),
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(AppError::invalid_input(format!(
            "unsupported log level `{other}`; expected off|trace|debug|info|warn|error"
        ))),
    }
}

fn normalize_log_dir(log_dir: &Path) -> Result<PathBuf, AppError> {
    if log_dir.as_os_str().is_empty() {
        return Err(AppError::invalid_input("log_dir cannot be empty"));
    }
    if !log_dir.is_absolute() {
        return Err(AppError::invalid_input(format!(
            "log_dir must be an absolute path, got `{}`",
            log_dir.display()
        )));
    }
    Ok(log_dir.to_path_buf())
}
