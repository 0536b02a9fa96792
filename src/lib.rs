pub mod core;
pub mod services;

pub use crate::core::extract::{
    AutoExtractor, ImageExtractor, ThumbnailExtractor, VideoFrameExtractor,
};
pub use crate::core::info::{load_preview, MediaInfo, MediaPreview};
pub use crate::core::media::MediaItem;
pub use crate::core::queue::JobQueue;
pub use crate::core::rendezvous::{Rendezvous, RendezvousBroken};
pub use crate::core::worker::{ThumbnailerConfig, ThumbnailerService, UiMessage};
