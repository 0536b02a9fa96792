use image::RgbaImage;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::services::fs::file_name_from_path;

/// Fixed edge sizes of the list-view thumbnail buffer.
pub const THUMBNAIL_WIDTH: u32 = 120;
pub const THUMBNAIL_HEIGHT: u32 = 120;

pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "webm", "m4v", "mpg", "mpeg", "ts", "3gp", "flv", "wmv",
];

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp",
];

/// Whether `path` looks like a video file, judged by extension.
pub fn is_video(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let ext = ext.to_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// A single media entry known to the browsing UI.
///
/// Items are handed to the thumbnail pipeline as jobs; the worker attaches
/// the generated thumbnail and passes ownership back to the consumer.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub id: Uuid,
    pub path: PathBuf,
    pub file_name: String,
    pub title: String,
    thumbnail: Option<RgbaImage>,
}

impl MediaItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = file_name_from_path(&path.to_string_lossy()).to_string();
        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.clone());

        Self {
            id: Uuid::new_v4(),
            path,
            file_name,
            title,
            thumbnail: None,
        }
    }

    pub fn set_thumbnail(&mut self, image: RgbaImage) {
        self.thumbnail = Some(image);
    }

    pub fn thumbnail(&self) -> Option<&RgbaImage> {
        self.thumbnail.as_ref()
    }

    pub fn take_thumbnail(&mut self) -> Option<RgbaImage> {
        self.thumbnail.take()
    }
}
