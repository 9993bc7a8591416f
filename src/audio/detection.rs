use std::path::Path;

/// Container format of a source audio file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Mp3,
    M4b,
}

impl ContainerKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContainerKind::Mp3 => "mp3",
            ContainerKind::M4b => "m4b",
        }
    }
}

/// Classify a file by extension. Only mp3 and m4b are book sources.
pub fn container_kind(path: &Path) -> Option<ContainerKind> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "mp3" => Some(ContainerKind::Mp3),
        "m4b" => Some(ContainerKind::M4b),
        _ => None,
    }
}

/// Check if a file is a recognized audio file based on its extension
pub fn is_audio_file(path: &Path) -> bool {
    container_kind(path).is_some()
}

/// File stems searched for loose cover art, in priority order only in
/// the sense that all of them qualify; candidates are ranked by
/// natural name order afterwards.
pub const COVER_STEMS: [&str; 4] = ["cover", "folder", "albumart", "front"];

/// Check if a file looks like loose cover art (cover.jpg, folder.png, ...)
pub fn is_cover_image(path: &Path) -> bool {
    let Some(ext) = path.extension() else {
        return false;
    };
    let ext = ext.to_string_lossy().to_lowercase();
    if !matches!(ext.as_str(), "jpg" | "jpeg" | "png") {
        return false;
    }
    path.file_stem()
        .map(|s| {
            let stem = s.to_string_lossy().to_lowercase();
            COVER_STEMS.contains(&stem.as_str())
        })
        .unwrap_or(false)
}
