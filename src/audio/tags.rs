//! Tag reading via lofty.
//!
//! Metadata resolution only ever needs the first file of a book, and
//! tests need to run without real tagged audio, so reading goes
//! through the `TagReader` trait.

use std::path::Path;

use lofty::{Accessor, Probe, TaggedFileExt};

/// Tags read from one audio file. Empty or whitespace-only values are
/// normalized to None.
#[derive(Debug, Clone, Default)]
pub struct FileTags {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    /// Raw bytes of the first embedded picture, if any
    pub front_cover: Option<Vec<u8>>,
}

pub trait TagReader {
    /// Read tags from a file. None means the file had no readable
    /// tags; that is never an error.
    fn read_tags(&self, path: &Path) -> Option<FileTags>;
}

/// Production reader backed by lofty.
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read_tags(&self, path: &Path) -> Option<FileTags> {
        let tagged_file = Probe::open(path).ok()?.read().ok()?;
        let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag())?;

        let front_cover = tag.pictures().first().map(|p| p.data().to_vec());

        Some(FileTags {
            artist: non_empty(tag.artist().map(|s| s.to_string())),
            album: non_empty(tag.album().map(|s| s.to_string())),
            title: non_empty(tag.title().map(|s| s.to_string())),
            genre: non_empty(tag.genre().map(|s| s.to_string())),
            year: tag.year().map(|y| y.to_string()),
            front_cover,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lofty_reader_handles_unreadable_file() {
        let reader = LoftyTagReader;
        assert!(reader.read_tags(Path::new("/nonexistent/file.mp3")).is_none());
    }

    #[test]
    fn test_non_empty_normalization() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some("".to_string())), None);
        assert_eq!(non_empty(Some(" x ".to_string())), Some("x".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
