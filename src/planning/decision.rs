//! Stream-copy versus re-encode decision.

use crate::audio::ContainerKind;
use crate::config::{AudioCodec, ProcessingMode, Settings};
use crate::planning::Book;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Remux the existing AAC stream without touching the audio
    StreamCopy,
    /// Decode and re-encode at the target bitrate
    ReEncode,
}

/// What the converter will do with one book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingDecision {
    pub strategy: Strategy,
    /// Target bitrate in kbps. For stream copy this is the measured
    /// source bitrate, kept for reporting.
    pub bitrate: u32,
    /// Source channel layout, preserved as-is
    pub channels: u32,
    pub codec: AudioCodec,
}

impl ProcessingDecision {
    pub fn describe(&self) -> String {
        match self.strategy {
            Strategy::StreamCopy => "stream copy".to_string(),
            Strategy::ReEncode => format!("re-encode @{}k", self.bitrate),
        }
    }
}

/// Decide how a book gets converted.
///
/// M4B sources under `auto` are remuxed without re-encoding; their
/// audio is already AAC. Everything else is re-encoded at the measured
/// source bitrate capped by the configured ceiling, so low-bitrate
/// sources are never inflated.
pub fn decide_processing(book: &Book, settings: &Settings) -> ProcessingDecision {
    let measured = book.measured_bitrate();
    let channels = book.channel_count();
    let codec = settings.audio_codec;

    if book.container == ContainerKind::M4b && settings.processing_mode == ProcessingMode::Auto {
        return ProcessingDecision {
            strategy: Strategy::StreamCopy,
            bitrate: measured,
            channels,
            codec,
        };
    }

    let bitrate = if measured == 0 {
        settings.max_bitrate
    } else {
        measured.min(settings.max_bitrate)
    };

    ProcessingDecision {
        strategy: Strategy::ReEncode,
        bitrate,
        channels,
        codec,
    }
}
