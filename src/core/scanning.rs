//! Audiobook folder discovery.
//!
//! Scans the immediate subdirectories of a root folder and groups the
//! audio files each one contains. Two layouts are recognized: flat
//! (audio directly in the folder) and multi-disc (audio one level
//! down, one subfolder per disc). Grouping works on paths only; audio
//! properties are probed later so this stage stays cheap and fully
//! testable.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::audio::{container_kind, is_audio_file, ContainerKind};
use crate::core::natural_sort::{natural_cmp, sort_paths_naturally};
use crate::error::{BindError, BookIssue};

/// One candidate audiobook folder with its grouped audio files.
#[derive(Debug, Clone)]
pub struct BookFolder {
    pub path: PathBuf,
    pub folder_name: String,
    pub layout: FolderLayout,
}

/// How the audio files are arranged inside a book folder.
#[derive(Debug, Clone)]
pub enum FolderLayout {
    /// Audio files directly in the folder, natural-ordered
    Flat(Vec<PathBuf>),
    /// One subfolder per disc, discs and files natural-ordered
    Discs(Vec<DiscFolder>),
}

#[derive(Debug, Clone)]
pub struct DiscFolder {
    pub name: String,
    pub files: Vec<PathBuf>,
}

impl BookFolder {
    /// All audio files in playback order.
    pub fn files(&self) -> Vec<&PathBuf> {
        match &self.layout {
            FolderLayout::Flat(files) => files.iter().collect(),
            FolderLayout::Discs(discs) => {
                discs.iter().flat_map(|d| d.files.iter()).collect()
            }
        }
    }

    pub fn file_count(&self) -> usize {
        match &self.layout {
            FolderLayout::Flat(files) => files.len(),
            FolderLayout::Discs(discs) => discs.iter().map(|d| d.files.len()).sum(),
        }
    }

    pub fn is_multi_disc(&self) -> bool {
        matches!(self.layout, FolderLayout::Discs(_))
    }

    /// Container shared by every file in the folder. Mixed folders are
    /// rejected during scanning, so the first file is representative.
    pub fn container(&self) -> Option<ContainerKind> {
        self.files().first().and_then(|p| container_kind(p))
    }
}

/// Result of scanning a root directory.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Book folders in natural name order
    pub folders: Vec<BookFolder>,
    /// Folders excluded because of an error (mixed containers,
    /// unreadable directories). Silently skipped folders are absent.
    pub issues: Vec<BookIssue>,
}

/// Scan the immediate subdirectories of `root` for audiobook folders.
///
/// The output directory is skipped when it lives inside the root, as
/// are hidden folders. One unreadable folder never aborts the scan.
pub fn scan_root(root: &Path, output_dir: &Path) -> Result<ScanOutcome, BindError> {
    if !root.is_dir() {
        return Err(BindError::Config(format!(
            "input path is not a directory: {}",
            root.display()
        )));
    }

    let mut candidates = Vec::new();
    let entries = fs::read_dir(root).map_err(|e| BindError::Scan {
        path: root.to_path_buf(),
        detail: e.to_string(),
    })?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        if same_path(&path, output_dir) {
            log::debug!("Skipping output directory: {}", path.display());
            continue;
        }
        candidates.push(path);
    }
    sort_paths_naturally(&mut candidates);

    let mut outcome = ScanOutcome::default();
    for candidate in candidates {
        match scan_book_folder(&candidate) {
            Ok(Some(folder)) => outcome.folders.push(folder),
            Ok(None) => {
                log::debug!("No audio in {}, skipping", candidate.display());
            }
            Err(error) => {
                outcome.issues.push(BookIssue::new(candidate, error));
            }
        }
    }

    Ok(outcome)
}

/// Group the audio files of one candidate folder.
///
/// Returns Ok(None) when the folder holds no audio at all.
fn scan_book_folder(path: &Path) -> Result<Option<BookFolder>, BindError> {
    let entries = list_dir(path)?;

    let mut top_audio: Vec<PathBuf> = entries
        .iter()
        .filter(|p| p.is_file() && is_audio_file(p))
        .cloned()
        .collect();

    let folder_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    // Top-level audio wins; disc subfolders are only considered when
    // the folder itself holds none.
    let layout = if !top_audio.is_empty() {
        sort_paths_naturally(&mut top_audio);
        FolderLayout::Flat(top_audio)
    } else {
        let mut discs = Vec::new();
        for entry in &entries {
            if !entry.is_dir() {
                continue;
            }
            let name = entry
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if name.starts_with('.') {
                continue;
            }
            let mut files: Vec<PathBuf> = list_dir(entry)?
                .into_iter()
                .filter(|p| p.is_file() && is_audio_file(p))
                .collect();
            if files.is_empty() {
                continue;
            }
            sort_paths_naturally(&mut files);
            discs.push(DiscFolder { name, files });
        }
        if discs.is_empty() {
            return Ok(None);
        }
        discs.sort_by(|a, b| natural_cmp(&a.name, &b.name));
        FolderLayout::Discs(discs)
    };

    let folder = BookFolder {
        path: path.to_path_buf(),
        folder_name,
        layout,
    };

    // A single book must be all mp3 or all m4b
    let kinds: std::collections::HashSet<ContainerKind> = folder
        .files()
        .iter()
        .filter_map(|p| container_kind(p))
        .collect();
    if kinds.len() > 1 {
        return Err(BindError::MixedContainers {
            folder: path.to_path_buf(),
        });
    }

    Ok(Some(folder))
}

/// List the direct children of a directory.
fn list_dir(path: &Path) -> Result<Vec<PathBuf>, BindError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(path)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
    {
        let entry = entry.map_err(|e| BindError::Scan {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        entries.push(entry.into_path());
    }
    Ok(entries)
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    fn scan(root: &Path) -> ScanOutcome {
        scan_root(root, &root.join("Output")).unwrap()
    }

    #[test]
    fn test_scan_nonexistent_root() {
        let result = scan_root(Path::new("/nonexistent/path"), Path::new("/tmp/out"));
        assert!(result.is_err());
    }

    #[test]
    fn test_scan_empty_root() {
        let temp = TempDir::new().unwrap();
        let outcome = scan(temp.path());
        assert!(outcome.folders.is_empty());
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_flat_book_in_natural_order() {
        let temp = TempDir::new().unwrap();
        let book = temp.path().join("My Book");
        fs::create_dir(&book).unwrap();
        touch(&book.join("ch10.mp3"));
        touch(&book.join("ch2.mp3"));
        touch(&book.join("ch1.mp3"));
        touch(&book.join("notes.txt"));

        let outcome = scan(temp.path());
        assert_eq!(outcome.folders.len(), 1);
        let folder = &outcome.folders[0];
        assert_eq!(folder.folder_name, "My Book");
        assert!(!folder.is_multi_disc());
        let names: Vec<String> = folder
            .files()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["ch1.mp3", "ch2.mp3", "ch10.mp3"]);
    }

    #[test]
    fn test_multi_disc_book() {
        let temp = TempDir::new().unwrap();
        let book = temp.path().join("Long Book");
        fs::create_dir_all(book.join("Disc 10")).unwrap();
        fs::create_dir_all(book.join("Disc 2")).unwrap();
        touch(&book.join("Disc 2").join("a.mp3"));
        touch(&book.join("Disc 10").join("b.mp3"));

        let outcome = scan(temp.path());
        assert_eq!(outcome.folders.len(), 1);
        let folder = &outcome.folders[0];
        assert!(folder.is_multi_disc());
        match &folder.layout {
            FolderLayout::Discs(discs) => {
                assert_eq!(discs.len(), 2);
                assert_eq!(discs[0].name, "Disc 2");
                assert_eq!(discs[1].name, "Disc 10");
            }
            FolderLayout::Flat(_) => panic!("expected disc layout"),
        }
        assert_eq!(folder.file_count(), 2);
    }

    #[test]
    fn test_top_level_audio_wins_over_subfolders() {
        let temp = TempDir::new().unwrap();
        let book = temp.path().join("Book");
        fs::create_dir_all(book.join("extras")).unwrap();
        touch(&book.join("whole-book.m4b"));
        touch(&book.join("extras").join("bonus.m4b"));

        let outcome = scan(temp.path());
        assert_eq!(outcome.folders.len(), 1);
        assert!(!outcome.folders[0].is_multi_disc());
        assert_eq!(outcome.folders[0].file_count(), 1);
    }

    #[test]
    fn test_mixed_containers_reported_and_excluded() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("Good Book");
        let mixed = temp.path().join("Mixed Book");
        fs::create_dir(&good).unwrap();
        fs::create_dir(&mixed).unwrap();
        touch(&good.join("ch1.mp3"));
        touch(&mixed.join("ch1.mp3"));
        touch(&mixed.join("ch2.m4b"));

        let outcome = scan(temp.path());
        assert_eq!(outcome.folders.len(), 1);
        assert_eq!(outcome.folders[0].folder_name, "Good Book");
        assert_eq!(outcome.issues.len(), 1);
        assert!(matches!(
            outcome.issues[0].error,
            BindError::MixedContainers { .. }
        ));
    }

    #[test]
    fn test_folder_without_audio_silently_skipped() {
        let temp = TempDir::new().unwrap();
        let empty = temp.path().join("Empty");
        fs::create_dir(&empty).unwrap();
        touch(&empty.join("readme.txt"));

        let outcome = scan(temp.path());
        assert!(outcome.folders.is_empty());
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_output_directory_not_scanned() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("Output");
        fs::create_dir(&output).unwrap();
        touch(&output.join("finished.m4b"));

        let outcome = scan(temp.path());
        assert!(outcome.folders.is_empty());
    }

    #[test]
    fn test_hidden_folders_ignored() {
        let temp = TempDir::new().unwrap();
        let hidden = temp.path().join(".stash");
        fs::create_dir(&hidden).unwrap();
        touch(&hidden.join("ch1.mp3"));

        let outcome = scan(temp.path());
        assert!(outcome.folders.is_empty());
    }

    #[test]
    fn test_folders_in_natural_order() {
        let temp = TempDir::new().unwrap();
        for name in ["Book 10", "Book 2", "Book 1"] {
            let dir = temp.path().join(name);
            fs::create_dir(&dir).unwrap();
            touch(&dir.join("ch1.mp3"));
        }

        let outcome = scan(temp.path());
        let names: Vec<&str> = outcome
            .folders
            .iter()
            .map(|f| f.folder_name.as_str())
            .collect();
        assert_eq!(names, vec!["Book 1", "Book 2", "Book 10"]);
    }

    #[test]
    fn test_container_detection() {
        let temp = TempDir::new().unwrap();
        let book = temp.path().join("M4B Book");
        fs::create_dir(&book).unwrap();
        touch(&book.join("part1.m4b"));

        let outcome = scan(temp.path());
        assert_eq!(outcome.folders[0].container(), Some(ContainerKind::M4b));
    }
}
