//! Core discovery logic
//!
//! This module contains:
//! - Natural ordering used everywhere file names decide sequence
//! - Audiobook folder scanning and layout grouping
//! - Filename sanitization for generated output names

pub mod natural_sort;
pub mod sanitize;
pub mod scanning;

pub use natural_sort::{natural_cmp, sort_paths_naturally};
pub use sanitize::sanitize_filename;
pub use scanning::{scan_root, BookFolder, DiscFolder, FolderLayout, ScanOutcome};
