//! Chapter mark computation.
//!
//! One chapter per source file, with start offsets accumulated across
//! disc boundaries so a multi-disc book plays as one continuous
//! timeline.

use std::path::{Path, PathBuf};

use crate::config::ChapterStyle;
use crate::planning::{AudioFile, Book, BookLayout};

/// One chapter mark in the bound book.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    /// Start offset in seconds from the beginning of the book
    pub start: f64,
    /// End offset in seconds; equals the next chapter's start
    pub end: f64,
    pub title: String,
    /// The source file this chapter came from
    pub source: PathBuf,
}

/// Build the chapter list for a book.
pub fn build_chapters(book: &Book, style: ChapterStyle) -> Vec<Chapter> {
    let total = book.file_count();
    let width = pad_width(total);

    let mut chapters = Vec::with_capacity(total);
    let mut offset = 0.0f64;
    let mut number = 0usize;

    match &book.layout {
        BookLayout::Flat(files) => {
            for file in files {
                number += 1;
                let title = flat_title(file, style, number, width);
                push_chapter(&mut chapters, file, &mut offset, title);
            }
        }
        BookLayout::Discs(discs) => {
            for disc in discs {
                for file in &disc.files {
                    number += 1;
                    let title = match style {
                        ChapterStyle::Sequential => numbered_title(number, width),
                        ChapterStyle::Filename => stem(&file.path),
                        ChapterStyle::Auto => {
                            format!("Disc {} - {}", disc.index, stem(&file.path))
                        }
                    };
                    push_chapter(&mut chapters, file, &mut offset, title);
                }
            }
        }
    }

    chapters
}

fn push_chapter(chapters: &mut Vec<Chapter>, file: &AudioFile, offset: &mut f64, title: String) {
    let start = *offset;
    *offset += file.duration;
    chapters.push(Chapter {
        start,
        end: *offset,
        title,
        source: file.path.clone(),
    });
}

fn flat_title(file: &AudioFile, style: ChapterStyle, number: usize, width: usize) -> String {
    match style {
        ChapterStyle::Filename => stem(&file.path),
        ChapterStyle::Sequential | ChapterStyle::Auto => numbered_title(number, width),
    }
}

fn numbered_title(number: usize, width: usize) -> String {
    format!("Chapter {:0width$}", number, width = width)
}

/// Zero-pad width: enough digits for the chapter count, two minimum.
fn pad_width(total: usize) -> usize {
    total.to_string().len().max(2)
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Chapter".to_string())
}
