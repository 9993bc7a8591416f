//! Container-level audio probing via symphonia.
//!
//! Only properties that affect planning are read: duration, bitrate,
//! and channel count. Decoding stays in ffmpeg.

use std::fs;
use std::fs::File;
use std::path::Path;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Measured properties of one source file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioProperties {
    /// Duration in seconds, always positive
    pub duration: f64,
    /// Overall bitrate in kbps, derived from size and duration
    pub bitrate: u32,
    /// Channel count (1 = mono, 2 = stereo)
    pub channels: u32,
}

/// Probe a source file for duration, bitrate, and channel count.
pub fn probe_audio_properties(path: &Path) -> Result<AudioProperties, String> {
    let file = File::open(path).map_err(|e| format!("Failed to open file: {}", e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(&ext.to_string_lossy());
    }

    let format_opts = FormatOptions::default();
    let metadata_opts = MetadataOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| format!("Failed to probe audio format: {}", e))?;

    let format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| "No default track found".to_string())?;

    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100) as f64;
    let n_frames = track.codec_params.n_frames.unwrap_or(0);
    let duration = n_frames as f64 / sample_rate;

    if duration <= 0.0 {
        return Err("Could not determine duration".to_string());
    }

    let channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u32)
        .unwrap_or(2);

    // Overall bitrate from file size and duration
    let file_size = fs::metadata(path)
        .map_err(|e| format!("Failed to get file metadata: {}", e))?
        .len();
    let bitrate = ((file_size * 8) as f64 / duration / 1000.0) as u32;

    Ok(AudioProperties {
        duration,
        bitrate,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_probe_nonexistent_file() {
        let result = probe_audio_properties(Path::new("/nonexistent/file.mp3"));
        assert!(result.is_err());
    }

    #[test]
    fn test_probe_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.mp3");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "this is not audio").unwrap();

        let result = probe_audio_properties(&path);
        assert!(result.is_err());
    }
}
