use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::core::media::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub recursive: bool,
    pub max_depth: Option<usize>,
    pub supported_formats: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: None,
            supported_formats: VIDEO_EXTENSIONS
                .iter()
                .chain(IMAGE_EXTENSIONS.iter())
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

/// Find media files under `dir` matching the configured extensions, in walk
/// order.
pub fn discover_media(dir: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::InvalidPath {
            path: dir.to_string_lossy().to_string(),
        });
    }

    let mut walker = WalkDir::new(dir).follow_links(false);
    if !options.recursive {
        walker = walker.max_depth(1);
    } else if let Some(max_depth) = options.max_depth {
        walker = walker.max_depth(max_depth);
    }

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let ext = ext.to_lowercase();
        if options.supported_formats.iter().any(|f| f == &ext) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}
