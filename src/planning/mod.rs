//! Per-book planning: probe grouped folders, resolve metadata and
//! cover art, pick a processing strategy, and compute chapters.
//!
//! The output of this module is a list of immutable `BookPlan`s; the
//! conversion layer consumes them without looking back at the
//! filesystem layout.

pub mod chapters;
pub mod cover;
pub mod decision;
pub mod metadata;
pub mod plan;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::audio::{container_kind, probe_audio_properties, ContainerKind, TagReader};
use crate::config::Settings;
use crate::core::scanning::{scan_root, BookFolder, FolderLayout};
use crate::error::{BindError, BookIssue};

pub use chapters::{build_chapters, Chapter};
pub use cover::{locate_cover_art, CoverArt, CoverSource};
pub use decision::{decide_processing, ProcessingDecision, Strategy};
pub use metadata::{resolve_metadata, BookMetadata};
pub use plan::BookPlan;

/// One probed source file. Immutable once built.
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub path: PathBuf,
    /// 1-based position in playback order, across discs
    pub ordinal: usize,
    /// Duration in seconds, always positive
    pub duration: f64,
    /// Measured bitrate in kbps
    pub bitrate: u32,
    pub channels: u32,
    pub container: ContainerKind,
}

/// A probed disc of a multi-disc book.
#[derive(Debug, Clone)]
pub struct DiscGroup {
    /// 1-based disc number in natural disc order
    pub index: usize,
    pub name: String,
    pub files: Vec<AudioFile>,
}

/// A fully probed book, ready for planning.
#[derive(Debug, Clone)]
pub struct Book {
    pub path: PathBuf,
    pub folder_name: String,
    pub container: ContainerKind,
    pub layout: BookLayout,
}

#[derive(Debug, Clone)]
pub enum BookLayout {
    Flat(Vec<AudioFile>),
    Discs(Vec<DiscGroup>),
}

impl Book {
    /// All files in playback order.
    pub fn files(&self) -> Vec<&AudioFile> {
        match &self.layout {
            BookLayout::Flat(files) => files.iter().collect(),
            BookLayout::Discs(discs) => discs.iter().flat_map(|d| d.files.iter()).collect(),
        }
    }

    pub fn file_count(&self) -> usize {
        match &self.layout {
            BookLayout::Flat(files) => files.len(),
            BookLayout::Discs(discs) => discs.iter().map(|d| d.files.len()).sum(),
        }
    }

    pub fn total_duration(&self) -> f64 {
        self.files().iter().map(|f| f.duration).sum()
    }

    /// Highest per-file bitrate; the book never sounds better than its
    /// best file.
    pub fn measured_bitrate(&self) -> u32 {
        self.files().iter().map(|f| f.bitrate).max().unwrap_or(0)
    }

    pub fn channel_count(&self) -> u32 {
        self.files().iter().map(|f| f.channels).max().unwrap_or(2)
    }

    pub fn is_multi_disc(&self) -> bool {
        matches!(self.layout, BookLayout::Discs(_))
    }

    pub fn first_file(&self) -> Option<&AudioFile> {
        self.files().first().copied()
    }
}

/// Probe every file of a grouped folder.
///
/// A single unreadable file excludes the whole book; a book with an
/// unknown duration cannot get correct chapter marks.
pub fn probe_book(folder: &BookFolder) -> Result<Book, BindError> {
    let container = folder.container().ok_or_else(|| BindError::Planning {
        path: folder.path.clone(),
        detail: "folder has no audio files".to_string(),
    })?;

    let mut ordinal = 0usize;
    let mut probe_one = |path: &PathBuf| -> Result<AudioFile, BindError> {
        let props = probe_audio_properties(path).map_err(|detail| BindError::Planning {
            path: path.clone(),
            detail,
        })?;
        ordinal += 1;
        Ok(AudioFile {
            path: path.clone(),
            ordinal,
            duration: props.duration,
            bitrate: props.bitrate,
            channels: props.channels,
            container: container_kind(path).unwrap_or(container),
        })
    };

    let layout = match &folder.layout {
        FolderLayout::Flat(paths) => {
            let mut files = Vec::with_capacity(paths.len());
            for path in paths {
                files.push(probe_one(path)?);
            }
            BookLayout::Flat(files)
        }
        FolderLayout::Discs(discs) => {
            let mut groups = Vec::with_capacity(discs.len());
            for (i, disc) in discs.iter().enumerate() {
                let mut files = Vec::with_capacity(disc.files.len());
                for path in &disc.files {
                    files.push(probe_one(path)?);
                }
                groups.push(DiscGroup {
                    index: i + 1,
                    name: disc.name.clone(),
                    files,
                });
            }
            BookLayout::Discs(groups)
        }
    };

    Ok(Book {
        path: folder.path.clone(),
        folder_name: folder.folder_name.clone(),
        container,
        layout,
    })
}

/// Everything a run needs to start converting.
#[derive(Debug)]
pub struct DiscoveryReport {
    pub plans: Vec<BookPlan>,
    pub issues: Vec<BookIssue>,
}

/// Scan the root and build a plan for every usable book folder.
///
/// Folders that fail probing or planning become issues; they never
/// stop the remaining folders from being planned.
pub fn discover_and_plan(
    root: &Path,
    output_dir: &Path,
    settings: &Settings,
    tags: &dyn TagReader,
) -> Result<DiscoveryReport, BindError> {
    let outcome = scan_root(root, output_dir)?;
    let mut report = DiscoveryReport {
        plans: Vec::new(),
        issues: outcome.issues,
    };

    let mut used_names: HashSet<String> = HashSet::new();
    for folder in outcome.folders {
        let folder_path = folder.path.clone();
        match plan_one(&folder, output_dir, settings, tags, &mut used_names) {
            Ok(plan) => report.plans.push(plan),
            Err(error) => report.issues.push(BookIssue::new(folder_path, error)),
        }
    }

    Ok(report)
}

fn plan_one(
    folder: &BookFolder,
    output_dir: &Path,
    settings: &Settings,
    tags: &dyn TagReader,
    used_names: &mut HashSet<String>,
) -> Result<BookPlan, BindError> {
    let book = probe_book(folder)?;
    let file_tags = book.first_file().and_then(|f| tags.read_tags(&f.path));
    let metadata = resolve_metadata(
        &book.folder_name,
        file_tags.as_ref(),
        &settings.folder_metadata_template,
        settings.sanitization_level,
    );
    let cover = locate_cover_art(&book.path, file_tags.as_ref(), settings.cover_art_quality);
    let decision = decide_processing(&book, settings);
    let chapters = build_chapters(&book, settings.chapter_style);
    let output_filename =
        plan::unique_output_filename(&metadata, settings.sanitization_level, used_names);
    let output_path = output_dir.join(&output_filename);

    Ok(BookPlan {
        book,
        metadata,
        cover,
        decision,
        chapters,
        output_filename,
        output_path,
    })
}
