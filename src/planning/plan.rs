//! The immutable per-book work order handed to the converter.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::SanitizationLevel;
use crate::core::sanitize::sanitize_filename;
use crate::planning::{Book, BookMetadata, Chapter, CoverArt, ProcessingDecision};

/// Longest output file stem we will generate.
const MAX_STEM_CHARS: usize = 200;

/// Everything needed to bind one book. Built once by planning and
/// consumed once by the executor.
#[derive(Debug)]
pub struct BookPlan {
    pub book: Book,
    pub metadata: BookMetadata,
    pub cover: Option<CoverArt>,
    pub decision: ProcessingDecision,
    pub chapters: Vec<Chapter>,
    /// Final file name, unique within the run
    pub output_filename: String,
    /// Final location inside the output directory
    pub output_path: PathBuf,
}

impl BookPlan {
    /// Identity used in logs and error messages.
    pub fn display_title(&self) -> String {
        format!("{} - {}", self.metadata.artist, self.metadata.title)
    }
}

/// Build the `<artist> - <title>` output stem, sanitized and capped.
/// When the combination is too long the title gives way first.
pub fn output_stem(metadata: &BookMetadata, level: SanitizationLevel) -> String {
    let artist = sanitize_filename(&metadata.artist, level);
    let title = sanitize_filename(&metadata.title, level);
    let sep = " - ";

    let artist_len = artist.chars().count();
    let title_len = title.chars().count();
    if artist_len + sep.len() + title_len <= MAX_STEM_CHARS {
        return format!("{artist}{sep}{title}");
    }
    if artist_len + sep.len() >= MAX_STEM_CHARS {
        let capped: String = format!("{artist}{sep}{title}")
            .chars()
            .take(MAX_STEM_CHARS)
            .collect();
        return capped.trim_end().to_string();
    }

    let title_budget = MAX_STEM_CHARS - artist_len - sep.len();
    let short: String = title.chars().take(title_budget).collect();
    format!("{artist}{sep}{}", short.trim_end())
}

/// Pick an output filename that no other book in this run uses.
/// Collisions get a " (n)" suffix; comparison is case-insensitive so
/// the result is safe on case-preserving filesystems.
pub fn unique_output_filename(
    metadata: &BookMetadata,
    level: SanitizationLevel,
    used: &mut HashSet<String>,
) -> String {
    let stem = output_stem(metadata, level);
    let mut candidate = format!("{stem}.m4b");
    let mut n = 1;
    while !used.insert(candidate.to_lowercase()) {
        candidate = format!("{stem} ({n}).m4b");
        n += 1;
    }
    candidate
}

#[cfg(test)]
impl BookPlan {
    /// Minimal plan for executor tests. The paths do not exist.
    pub fn new_for_test(name: &str) -> Self {
        use crate::audio::ContainerKind;
        use crate::config::{ChapterStyle, Settings};
        use crate::planning::{build_chapters, decide_processing, fixtures};

        let book = fixtures::flat_book(name, ContainerKind::Mp3, &[(60.0, 128), (60.0, 128)]);
        let metadata = BookMetadata {
            artist: "Test Author".to_string(),
            title: name.to_string(),
            year: None,
            genre: None,
        };
        let settings = Settings::default();
        let decision = decide_processing(&book, &settings);
        let chapters = build_chapters(&book, ChapterStyle::Sequential);
        let output_filename = format!("Test Author - {name}.m4b");
        let output_path = PathBuf::from("/nonexistent/output").join(&output_filename);
        Self {
            book,
            metadata,
            cover: None,
            decision,
            chapters,
            output_filename,
            output_path,
        }
    }
}
