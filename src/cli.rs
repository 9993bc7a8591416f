use std::path::PathBuf;

use clap::Parser;

use crate::config::{
    AudioCodec, ChapterStyle, CoverArtQuality, ProcessingMode, SanitizationLevel, Settings,
};

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "m4b-binder")]
#[command(about = "Bind folders of chaptered audio into M4B audiobooks", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory containing audiobook folders, one book per folder
    #[arg(default_value = ".")]
    pub input_dir: PathBuf,

    /// Where finished books go (default: <input>/Output)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON settings file (default: ~/.m4b-binder.json when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bitrate ceiling in kbps (64, 96, 128, 192, 256, 320)
    #[arg(short, long)]
    pub bitrate: Option<u32>,

    /// How m4b sources are treated
    #[arg(long, value_enum)]
    pub mode: Option<ProcessingMode>,

    /// Chapter title style
    #[arg(long, value_enum)]
    pub chapter_style: Option<ChapterStyle>,

    /// Cover art handling
    #[arg(long, value_enum)]
    pub cover_quality: Option<CoverArtQuality>,

    /// Target codec for re-encoded books
    #[arg(long, value_enum)]
    pub codec: Option<AudioCodec>,

    /// Filename sanitization level
    #[arg(long, value_enum)]
    pub sanitize: Option<SanitizationLevel>,

    /// Maximum number of books converted at once
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(bitrate) = self.bitrate {
            settings.max_bitrate = bitrate;
        }
        if let Some(mode) = self.mode {
            settings.processing_mode = mode;
        }
        if let Some(style) = self.chapter_style {
            settings.chapter_style = style;
        }
        if let Some(quality) = self.cover_quality {
            settings.cover_art_quality = quality;
        }
        if let Some(codec) = self.codec {
            settings.audio_codec = codec;
        }
        if let Some(level) = self.sanitize {
            settings.sanitization_level = level;
        }
        if let Some(jobs) = self.jobs {
            settings.concurrency_limit = jobs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["m4b-binder"]);
        assert_eq!(cli.input_dir, PathBuf::from("."));
        assert!(cli.output.is_none());

        let mut settings = Settings::default();
        cli.apply_to(&mut settings);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "m4b-binder",
            "/books",
            "--bitrate",
            "192",
            "--mode",
            "force-re-encode",
            "--codec",
            "he-aac",
            "--jobs",
            "3",
        ]);
        assert_eq!(cli.input_dir, PathBuf::from("/books"));

        let mut settings = Settings::default();
        cli.apply_to(&mut settings);
        assert_eq!(settings.max_bitrate, 192);
        assert_eq!(settings.processing_mode, ProcessingMode::ForceReEncode);
        assert_eq!(settings.audio_codec, AudioCodec::HeAac);
        assert_eq!(settings.concurrency_limit, 3);
    }

    #[test]
    fn test_invalid_enum_value_rejected() {
        let result = Cli::try_parse_from(["m4b-binder", "--mode", "sometimes"]);
        assert!(result.is_err());
    }
}
