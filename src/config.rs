//! Run settings: one immutable snapshot loaded at startup.
//!
//! Settings come from an optional JSON file (default
//! `~/.m4b-binder.json`) and are overridden by command-line flags.
//! They are validated once and then passed by reference; nothing
//! mutates them after `validate()` succeeds.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::BindError;

/// Bitrate ceilings the planner will accept, in kbps.
pub const ALLOWED_BITRATES: [u32; 6] = [64, 96, 128, 192, 256, 320];

/// How to treat books that are already in an MP4 container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingMode {
    /// Stream-copy m4b sources, re-encode everything else
    #[default]
    Auto,
    /// Re-encode every book, m4b sources included
    ForceReEncode,
}

/// Character set stripped from output filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SanitizationLevel {
    /// Strip characters that are invalid on common filesystems
    #[default]
    Basic,
    /// Also strip punctuation and collapse whitespace runs
    Aggressive,
}

/// How chapter titles are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ChapterStyle {
    /// Disc-aware titles for multi-disc books, numbered otherwise
    #[default]
    Auto,
    /// "Chapter 01", "Chapter 02", ...
    Sequential,
    /// Source file stem as the chapter title
    Filename,
}

/// Whether cover art is embedded as-is or downscaled first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CoverArtQuality {
    /// Embed the source image untouched
    #[default]
    Original,
    /// Downscale to at most 500x500 and re-encode as JPEG
    Optimized,
}

/// Target audio codec for re-encoded books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AudioCodec {
    #[default]
    AacLc,
    HeAac,
}

impl AudioCodec {
    /// The `-profile:a` value ffmpeg expects.
    pub fn ffmpeg_profile(&self) -> &'static str {
        match self {
            AudioCodec::AacLc => "aac_low",
            AudioCodec::HeAac => "aac_he",
        }
    }
}

/// A field that can be parsed out of a folder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateField {
    Artist,
    Title,
    Year,
}

/// Template for extracting metadata from folder names when tags are
/// missing, e.g. fields `[artist, title]` with separator `" - "` parses
/// "Jane Doe - The Long Road".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderTemplate {
    pub fields: Vec<TemplateField>,
    pub separator: String,
}

impl Default for FolderTemplate {
    fn default() -> Self {
        Self {
            fields: vec![TemplateField::Artist, TemplateField::Title],
            separator: " - ".to_string(),
        }
    }
}

impl FolderTemplate {
    fn validate(&self) -> Result<(), String> {
        if self.fields.is_empty() {
            return Err("folder template has no fields".to_string());
        }
        if self.separator.is_empty() {
            return Err("folder template separator is empty".to_string());
        }
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].contains(field) {
                return Err(format!("folder template repeats field {:?}", field));
            }
        }
        Ok(())
    }
}

/// All knobs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Bitrate ceiling in kbps; sources below it are never upscaled
    pub max_bitrate: u32,
    pub processing_mode: ProcessingMode,
    pub sanitization_level: SanitizationLevel,
    pub chapter_style: ChapterStyle,
    pub cover_art_quality: CoverArtQuality,
    pub audio_codec: AudioCodec,
    pub folder_metadata_template: FolderTemplate,
    /// Maximum number of books converted at once
    pub concurrency_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_bitrate: 128,
            processing_mode: ProcessingMode::default(),
            sanitization_level: SanitizationLevel::default(),
            chapter_style: ChapterStyle::default(),
            cover_art_quality: CoverArtQuality::default(),
            audio_codec: AudioCodec::default(),
            folder_metadata_template: FolderTemplate::default(),
            concurrency_limit: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}

impl Settings {
    /// Reject out-of-range values before any work starts.
    pub fn validate(&self) -> Result<(), BindError> {
        if !ALLOWED_BITRATES.contains(&self.max_bitrate) {
            return Err(BindError::Config(format!(
                "max_bitrate must be one of {:?}, got {}",
                ALLOWED_BITRATES, self.max_bitrate
            )));
        }
        if self.concurrency_limit < 1 {
            return Err(BindError::Config(
                "concurrency_limit must be at least 1".to_string(),
            ));
        }
        self.folder_metadata_template
            .validate()
            .map_err(BindError::Config)?;
        Ok(())
    }

    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, BindError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BindError::Config(format!("cannot read settings file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            BindError::Config(format!("invalid settings file {}: {}", path.display(), e))
        })
    }

    /// Load from the default settings file if one exists, otherwise
    /// return the built-in defaults.
    pub fn load_default() -> Result<Self, BindError> {
        match default_settings_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// Default settings file location: `~/.m4b-binder.json`
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".m4b-binder.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.max_bitrate, 128);
        assert!(settings.concurrency_limit >= 1);
    }

    #[test]
    fn test_rejects_unlisted_bitrate() {
        let settings = Settings {
            max_bitrate: 100,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let settings = Settings {
            concurrency_limit: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_template() {
        let settings = Settings {
            folder_metadata_template: FolderTemplate {
                fields: vec![],
                separator: " - ".to_string(),
            },
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_template_fields() {
        let settings = Settings {
            folder_metadata_template: FolderTemplate {
                fields: vec![TemplateField::Title, TemplateField::Title],
                separator: " - ".to_string(),
            },
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"max_bitrate": 192, "audio_codec": "he-aac"}}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.max_bitrate, 192);
        assert_eq!(settings.audio_codec, AudioCodec::HeAac);
        assert_eq!(settings.processing_mode, ProcessingMode::Auto);
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"max_bitrates": 192}}"#).unwrap();

        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_load_rejects_unknown_enum_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"processing_mode": "sometimes"}}"#).unwrap();

        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_codec_profiles() {
        assert_eq!(AudioCodec::AacLc.ffmpeg_profile(), "aac_low");
        assert_eq!(AudioCodec::HeAac.ffmpeg_profile(), "aac_he");
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = Settings {
            max_bitrate: 256,
            processing_mode: ProcessingMode::ForceReEncode,
            ..Settings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("force-re-encode"));

        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_bitrate, 256);
        assert_eq!(back.processing_mode, ProcessingMode::ForceReEncode);
    }
}
