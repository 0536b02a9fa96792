use chrono::{DateTime, Utc};
use image::RgbaImage;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::extract::ThumbnailExtractor;
use crate::services::fs::file_name_from_path;

#[derive(Debug, Error)]
pub enum InfoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid path: {path}")]
    InvalidPath { path: String },
}

/// Display metadata for a single media item.
#[derive(Debug, Clone, Serialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub title: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub modified_at: Option<String>,
}

impl MediaInfo {
    pub fn from_path(path: &Path) -> Result<Self, InfoError> {
        if !path.exists() {
            return Err(InfoError::InvalidPath {
                path: path.to_string_lossy().to_string(),
            });
        }

        let metadata = fs::metadata(path)?;
        let file_name = file_name_from_path(&path.to_string_lossy()).to_string();
        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.clone());
        let modified_at = metadata
            .modified()
            .ok()
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339());

        Ok(Self {
            path: path.to_path_buf(),
            title,
            file_name,
            size_bytes: metadata.len(),
            modified_at,
        })
    }
}

/// Metadata plus a square display thumbnail, trimmed of letterbox borders.
pub struct MediaPreview {
    pub info: MediaInfo,
    pub image: Option<RgbaImage>,
}

/// Build the detail view of one media file: metadata plus a preview image at
/// `edge`×`edge` pixels. A failed extraction leaves `image` empty.
pub fn load_preview(
    path: &Path,
    extractor: &dyn ThumbnailExtractor,
    edge: u32,
) -> Result<MediaPreview, InfoError> {
    let info = MediaInfo::from_path(path)?;
    let image = extractor
        .extract(path, edge, edge)
        .map(|img| trim_letterbox(&img));
    Ok(MediaPreview { info, image })
}

/// Crop away the symmetric black or transparent borders a scaled video frame
/// often carries, probing the center column and the center row.
pub fn trim_letterbox(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let mut top = 0;
    for y in 0..height {
        if is_blank(image.get_pixel(width / 2, y)) {
            top = y + 1;
        } else {
            break;
        }
    }

    let mut left = 0;
    for x in 0..width {
        if is_blank(image.get_pixel(x, height / 2)) {
            left = x + 1;
        } else {
            break;
        }
    }

    if left * 2 >= width || top * 2 >= height {
        // The probe lines were entirely blank; keep the image instead of
        // cropping it to nothing.
        return image.clone();
    }

    image::imageops::crop_imm(image, left, top, width - 2 * left, height - 2 * top).to_image()
}

fn is_blank(pixel: &image::Rgba<u8>) -> bool {
    let [r, g, b, a] = pixel.0;
    a == 0 || (r == 0 && g == 0 && b == 0)
}
