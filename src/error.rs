//! Error types shared across scanning, planning, and conversion.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while binding audiobooks.
///
/// Per-book errors (`Scan`, `MixedContainers`, `Planning`, `Transcode`,
/// `Write`) exclude or fail a single book and never abort the run.
/// `Config` is fatal: a bad root, output directory, or settings file.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("failed to scan {path}: {detail}")]
    Scan { path: PathBuf, detail: String },

    #[error("folder mixes mp3 and m4b files: {folder}")]
    MixedContainers { folder: PathBuf },

    #[error("cannot plan {path}: {detail}")]
    Planning { path: PathBuf, detail: String },

    #[error("transcode failed for \"{book}\": {detail}")]
    Transcode { book: String, detail: String },

    #[error("failed to write {path}: {detail}")]
    Write { path: PathBuf, detail: String },

    #[error("configuration error: {0}")]
    Config(String),
}

/// A folder that was excluded from the run, with the reason.
#[derive(Debug)]
pub struct BookIssue {
    pub folder: PathBuf,
    pub error: BindError,
}

impl BookIssue {
    pub fn new(folder: PathBuf, error: BindError) -> Self {
        Self { folder, error }
    }
}
