//! Conversion module
//!
//! Binds planned books into M4B files with ffmpeg, bounded-parallel.

mod ffmpeg;
mod parallel;

pub use ffmpeg::bind_book;
pub use parallel::{execute_plans, BookOutcome, ExecutionSummary};

use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::error::BindError;

/// Verify that ffmpeg is on PATH and runnable before any work starts.
pub fn verify_ffmpeg() -> Result<(), BindError> {
    let status = std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(s) if s.success() => Ok(()),
        Ok(s) => Err(BindError::Config(format!(
            "ffmpeg -version exited with status {}",
            s
        ))),
        Err(e) => Err(BindError::Config(format!(
            "ffmpeg not found on PATH: {}",
            e
        ))),
    }
}

/// Where finished books go: an explicit override, or "Output" inside
/// the input root.
pub fn resolve_output_dir(root: &Path, override_dir: Option<PathBuf>) -> PathBuf {
    override_dir.unwrap_or_else(|| root.join("Output"))
}

/// Create the output directory if needed. Existing contents are kept;
/// finished books from earlier runs must survive.
pub fn ensure_output_dir(path: &Path) -> Result<(), BindError> {
    std::fs::create_dir_all(path).map_err(|e| BindError::Write {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}
