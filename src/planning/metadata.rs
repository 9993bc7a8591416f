//! Book metadata resolution.
//!
//! Tags from the first file win. Whatever they leave empty is parsed
//! from the folder name using the configured template, and whatever
//! the template cannot supply falls back to "Unknown" / the folder
//! name itself.

use std::collections::HashMap;

use crate::audio::FileTags;
use crate::config::{FolderTemplate, SanitizationLevel, TemplateField};
use crate::core::sanitize::sanitize_filename;

/// Resolved metadata for one book.
#[derive(Debug, Clone, PartialEq)]
pub struct BookMetadata {
    pub artist: String,
    pub title: String,
    pub year: Option<String>,
    pub genre: Option<String>,
}

/// Resolve book metadata from tags and the folder name.
///
/// The book title prefers the album tag over the track title tag: a
/// chapter file's title is usually "Chapter 1", not the book name.
pub fn resolve_metadata(
    folder_name: &str,
    tags: Option<&FileTags>,
    template: &FolderTemplate,
    level: SanitizationLevel,
) -> BookMetadata {
    let mut artist = tags.and_then(|t| t.artist.clone());
    let mut title = tags.and_then(|t| t.album.clone().or_else(|| t.title.clone()));
    let mut year = tags.and_then(|t| t.year.clone());
    let genre = tags.and_then(|t| t.genre.clone());

    if artist.is_none() || title.is_none() || year.is_none() {
        let parsed = parse_folder_name(folder_name, template);
        // Template fills gaps only; tags are never overridden
        if artist.is_none() {
            artist = parsed.get(&TemplateField::Artist).cloned();
        }
        if title.is_none() {
            title = parsed.get(&TemplateField::Title).cloned();
        }
        if year.is_none() {
            year = parsed.get(&TemplateField::Year).cloned();
        }
    }

    BookMetadata {
        artist: artist.unwrap_or_else(|| "Unknown".to_string()),
        title: title.unwrap_or_else(|| sanitize_filename(folder_name, level)),
        year,
        genre,
    }
}

/// Split a folder name on the template separator and map the pieces
/// to fields, left to right. The last field absorbs any extra
/// separator occurrences. A name with fewer pieces than the template
/// has fields fills what it can; the remaining fields stay unfilled.
pub fn parse_folder_name(
    name: &str,
    template: &FolderTemplate,
) -> HashMap<TemplateField, String> {
    let parts = name.splitn(template.fields.len(), &template.separator);

    let mut parsed = HashMap::new();
    for (field, part) in template.fields.iter().zip(parts) {
        let part = part.trim();
        if !part.is_empty() {
            parsed.insert(*field, part.to_string());
        }
    }
    parsed
}
