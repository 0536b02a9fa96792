use image::{imageops::FilterType, DynamicImage, RgbaImage};
use std::path::Path;
use std::process::Command;

use super::media::is_video;

/// Produces fixed-size thumbnails for media files.
///
/// Extraction failure is signalled by `None`; no error reaches the pipeline,
/// which simply skips the item.
pub trait ThumbnailExtractor: Send + Sync {
    fn extract(&self, path: &Path, width: u32, height: u32) -> Option<RgbaImage>;
}

/// Extractor for still images.
pub struct ImageExtractor;

impl ImageExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ThumbnailExtractor for ImageExtractor {
    fn extract(&self, path: &Path, width: u32, height: u32) -> Option<RgbaImage> {
        let img = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("failed to decode {}: {}", path.display(), e);
                return None;
            }
        };
        Some(scale_to_buffer(img, width, height))
    }
}

/// Extractor for video files: grabs frame zero with the `ffmpeg` binary and
/// scales it like a still image.
pub struct VideoFrameExtractor;

impl VideoFrameExtractor {
    pub fn new() -> Self {
        Self
    }

    fn first_frame(&self, path: &Path) -> anyhow::Result<DynamicImage> {
        let frame_file = tempfile::Builder::new().suffix(".png").tempfile()?;

        let status = Command::new("ffmpeg")
            .arg("-loglevel")
            .arg("error")
            .arg("-y") // the temp file already exists, allow overwriting
            .arg("-i")
            .arg(path.as_os_str())
            .arg("-update")
            .arg("true")
            .arg("-vf")
            .arg(r"select=eq(n\,0)") // select frame zero
            .arg(frame_file.path())
            .status()?;

        if !status.success() {
            anyhow::bail!("ffmpeg exited with status {:?}", status.code());
        }

        Ok(image::open(frame_file.path())?)
    }
}

impl Default for VideoFrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ThumbnailExtractor for VideoFrameExtractor {
    fn extract(&self, path: &Path, width: u32, height: u32) -> Option<RgbaImage> {
        match self.first_frame(path) {
            Ok(frame) => Some(scale_to_buffer(frame, width, height)),
            Err(e) => {
                log::warn!("failed to grab frame from {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Dispatches to the video or image extractor based on file extension.
pub struct AutoExtractor {
    image: ImageExtractor,
    video: VideoFrameExtractor,
}

impl AutoExtractor {
    pub fn new() -> Self {
        Self {
            image: ImageExtractor::new(),
            video: VideoFrameExtractor::new(),
        }
    }
}

impl Default for AutoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ThumbnailExtractor for AutoExtractor {
    fn extract(&self, path: &Path, width: u32, height: u32) -> Option<RgbaImage> {
        if is_video(path) {
            self.video.extract(path, width, height)
        } else {
            self.image.extract(path, width, height)
        }
    }
}

/// Fill the fixed-size result buffer, cropping overflow rather than padding,
/// so every thumbnail comes out exactly `width`×`height`.
fn scale_to_buffer(img: DynamicImage, width: u32, height: u32) -> RgbaImage {
    img.resize_to_fill(width, height, FilterType::Lanczos3)
        .to_rgba8()
}
