// Audio module - file type detection, container probing, and tag reading

pub mod detection;
pub mod probe;
pub mod tags;

pub use detection::{container_kind, is_audio_file, is_cover_image, ContainerKind};
pub use probe::{probe_audio_properties, AudioProperties};
pub use tags::{FileTags, LoftyTagReader, TagReader};
