//! Combined terminal and file logging via simplelog.
//!
//! The terminal shows info and above; the log file keeps debug and
//! above so a failed run can be diagnosed after the fact. File logging
//! is best-effort: if the log file cannot be opened the run continues
//! with terminal output only.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

const LOG_FILE_NAME: &str = "m4b-binder.log";
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Platform log directory: `~/Library/Logs/m4b-binder` on macOS, the
/// local data directory elsewhere.
pub fn log_directory() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Logs").join("m4b-binder"))
    } else {
        dirs::data_local_dir().map(|d| d.join("m4b-binder").join("logs"))
    }
}

pub fn log_file_path() -> Option<PathBuf> {
    log_directory().map(|d| d.join(LOG_FILE_NAME))
}

/// Set up combined logging. Returns the log file path when file
/// logging is active.
pub fn init_logging() -> Option<PathBuf> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Info,
        build_config(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    let log_path = open_log_file().map(|(path, file)| {
        loggers.push(WriteLogger::new(LevelFilter::Debug, build_config(), file));
        path
    });

    if CombinedLogger::init(loggers).is_err() {
        eprintln!("Warning: logger already initialized");
    }
    if let Some(path) = &log_path {
        log::debug!("Log file: {}", path.display());
    }

    log_path
}

/// Open the log file for appending, rotating it first when it has
/// grown past the size cap.
fn open_log_file() -> Option<(PathBuf, fs::File)> {
    let dir = log_directory()?;
    if let Err(e) = fs::create_dir_all(&dir) {
        eprintln!("Warning: could not create log directory: {}", e);
        return None;
    }

    let path = dir.join(LOG_FILE_NAME);
    rotate_if_large(&path, &dir);

    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some((path, file)),
        Err(e) => {
            eprintln!("Warning: could not open log file: {}", e);
            None
        }
    }
}

fn rotate_if_large(path: &Path, dir: &Path) {
    if let Ok(metadata) = fs::metadata(path) {
        if metadata.len() > MAX_LOG_BYTES {
            let _ = fs::rename(path, dir.join(format!("{LOG_FILE_NAME}.old")));
        }
    }
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build()
}
