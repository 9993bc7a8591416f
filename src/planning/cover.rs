//! Cover art location and optional downscaling.
//!
//! Loose image files in the book folder (cover.jpg and friends) are
//! preferred over art embedded in the audio; a loose file is usually
//! the better scan. Missing art is recorded as None, never an error.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::audio::{is_cover_image, FileTags};
use crate::config::CoverArtQuality;
use crate::core::natural_sort::sort_paths_naturally;

/// Longest edge kept by the optimized quality setting.
pub const MAX_OPTIMIZED_EDGE: u32 = 500;

#[derive(Debug, Clone, PartialEq)]
pub enum CoverSource {
    /// A loose image file in the book folder
    FolderFile(PathBuf),
    /// Art embedded in the first audio file's tags
    Embedded,
}

/// Cover art ready for embedding.
#[derive(Debug, Clone)]
pub struct CoverArt {
    pub data: Vec<u8>,
    pub source: CoverSource,
    /// Dimensions of the source image, before any downscaling
    pub width: u32,
    pub height: u32,
    /// Extension matching `data`, for temp files handed to the muxer
    pub file_ext: &'static str,
}

/// Find cover art for a book folder.
///
/// Loose cover files are tried first in natural name order, then art
/// embedded in the first file's tags. Undecodable images are skipped,
/// not fatal.
pub fn locate_cover_art(
    folder: &Path,
    tags: Option<&FileTags>,
    quality: CoverArtQuality,
) -> Option<CoverArt> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(folder)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file() && is_cover_image(p))
                .collect()
        })
        .unwrap_or_default();
    sort_paths_naturally(&mut candidates);

    for candidate in candidates {
        if let Ok(data) = fs::read(&candidate) {
            if let Some(art) = prepare(data, CoverSource::FolderFile(candidate.clone()), quality) {
                return Some(art);
            }
            log::debug!("Could not decode cover image {}", candidate.display());
        }
    }

    let embedded = tags?.front_cover.clone()?;
    prepare(embedded, CoverSource::Embedded, quality)
}

fn prepare(data: Vec<u8>, source: CoverSource, quality: CoverArtQuality) -> Option<CoverArt> {
    let img = image::load_from_memory(&data).ok()?;
    let (width, height) = (img.width(), img.height());

    let needs_downscale = quality == CoverArtQuality::Optimized
        && (width > MAX_OPTIMIZED_EDGE || height > MAX_OPTIMIZED_EDGE);

    if !needs_downscale {
        let file_ext = match image::guess_format(&data).ok()? {
            image::ImageFormat::Png => "png",
            _ => "jpg",
        };
        return Some(CoverArt {
            data,
            source,
            width,
            height,
            file_ext,
        });
    }

    // Aspect-preserving downscale, re-encoded as JPEG
    let scaled = img.thumbnail(MAX_OPTIMIZED_EDGE, MAX_OPTIMIZED_EDGE);
    let mut buf = Cursor::new(Vec::new());
    scaled.write_to(&mut buf, image::ImageFormat::Jpeg).ok()?;
    Some(CoverArt {
        data: buf.into_inner(),
        source,
        width,
        height,
        file_ext: "jpg",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_no_candidates_yields_none() {
        let temp = TempDir::new().unwrap();
        assert!(locate_cover_art(temp.path(), None, CoverArtQuality::Original).is_none());
    }

    #[test]
    fn test_folder_file_preferred_over_embedded() {
        let temp = TempDir::new().unwrap();
        let cover_path = temp.path().join("cover.png");
        fs::write(&cover_path, png_bytes(100, 100)).unwrap();
        let tags = FileTags {
            front_cover: Some(png_bytes(50, 50)),
            ..FileTags::default()
        };

        let art = locate_cover_art(temp.path(), Some(&tags), CoverArtQuality::Original).unwrap();
        assert_eq!(art.source, CoverSource::FolderFile(cover_path));
        assert_eq!((art.width, art.height), (100, 100));
    }

    #[test]
    fn test_embedded_fallback() {
        let temp = TempDir::new().unwrap();
        let tags = FileTags {
            front_cover: Some(png_bytes(50, 50)),
            ..FileTags::default()
        };

        let art = locate_cover_art(temp.path(), Some(&tags), CoverArtQuality::Original).unwrap();
        assert_eq!(art.source, CoverSource::Embedded);
    }

    #[test]
    fn test_candidates_ranked_by_natural_order() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("folder.png"), png_bytes(10, 10)).unwrap();
        fs::write(temp.path().join("cover.png"), png_bytes(20, 20)).unwrap();

        let art = locate_cover_art(temp.path(), None, CoverArtQuality::Original).unwrap();
        // "cover" sorts before "folder"
        assert_eq!(
            art.source,
            CoverSource::FolderFile(temp.path().join("cover.png"))
        );
    }

    #[test]
    fn test_undecodable_cover_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("cover.jpg"), b"not an image").unwrap();
        fs::write(temp.path().join("folder.png"), png_bytes(10, 10)).unwrap();

        let art = locate_cover_art(temp.path(), None, CoverArtQuality::Original).unwrap();
        assert_eq!(
            art.source,
            CoverSource::FolderFile(temp.path().join("folder.png"))
        );
    }

    #[test]
    fn test_optimized_downscales_large_art() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("cover.png"), png_bytes(800, 600)).unwrap();

        let art = locate_cover_art(temp.path(), None, CoverArtQuality::Optimized).unwrap();
        // Original dimensions are recorded even after downscaling
        assert_eq!((art.width, art.height), (800, 600));
        assert_eq!(art.file_ext, "jpg");

        let scaled = image::load_from_memory(&art.data).unwrap();
        assert!(scaled.width() <= MAX_OPTIMIZED_EDGE);
        assert!(scaled.height() <= MAX_OPTIMIZED_EDGE);
        // Aspect ratio preserved: 800x600 -> 500x375
        assert_eq!((scaled.width(), scaled.height()), (500, 375));
    }

    #[test]
    fn test_optimized_leaves_small_art_untouched() {
        let temp = TempDir::new().unwrap();
        let bytes = png_bytes(300, 300);
        fs::write(temp.path().join("cover.png"), &bytes).unwrap();

        let art = locate_cover_art(temp.path(), None, CoverArtQuality::Optimized).unwrap();
        assert_eq!(art.data, bytes);
        assert_eq!(art.file_ext, "png");
    }
}
