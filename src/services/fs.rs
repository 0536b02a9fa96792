use memmap2::Mmap;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Size of the head and tail chunks fed to the media-match hash (64 KiB).
const HASH_CHUNK_SIZE: u64 = 64 * 1024;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid path: {path}")]
    InvalidPath { path: String },
}

/// Last segment of a string path, ignoring a single trailing slash.
pub fn file_name_from_path(path: &str) -> &str {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    match trimmed.rfind('/') {
        Some(index) => &trimmed[index + 1..],
        None => trimmed,
    }
}

/// Parent of a string path. The root is its own parent.
pub fn parent_path(path: &str) -> &str {
    if path == "/" {
        return path;
    }
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    match trimmed.rfind('/') {
        Some(0) => "/",
        Some(index) => &trimmed[..index],
        None => trimmed,
    }
}

/// Copy a file, or recursively copy a directory tree.
pub fn copy_path(src: &Path, dst: &Path) -> io::Result<()> {
    if src.is_dir() {
        fs::create_dir_all(dst)?;
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            copy_path(&entry.path(), &dst.join(entry.file_name()))?;
        }
    } else {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dst)?;
    }
    Ok(())
}

/// Delete a single file.
pub fn delete_file(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

/// Recursively delete a file or directory. Paths that do not exist or are
/// marked read-only are left untouched.
pub fn remove_recursive(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let metadata = fs::metadata(path)?;
    if metadata.permissions().readonly() {
        return Ok(());
    }
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Checksum used to match a media file against subtitle databases: the file
/// size plus a wrapping little-endian u64 sum over the first and last 64 KiB,
/// rendered as 16 hex digits.
pub fn media_match_hash(path: &Path) -> Result<String, FsError> {
    if !path.is_file() {
        return Err(FsError::InvalidPath {
            path: path.to_string_lossy().to_string(),
        });
    }
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    if size == 0 {
        // Mapping a zero-length file is an error on most platforms.
        return Ok(format!("{:016x}", 0u64));
    }
    let chunk_size = HASH_CHUNK_SIZE.min(size) as usize;

    let map = unsafe { Mmap::map(&file)? };
    let head = chunk_sum(&map[..chunk_size]);

    // The tail window starts one chunk before EOF, clamped to the start, so
    // short files hash their full contents twice.
    let tail_offset = size.saturating_sub(HASH_CHUNK_SIZE) as usize;
    let tail = chunk_sum(&map[tail_offset..]);

    Ok(format!(
        "{:016x}",
        size.wrapping_add(head).wrapping_add(tail)
    ))
}

/// Wrapping sum of the little-endian u64 words of `chunk`. A trailing
/// partial word does not contribute, matching the reference checksum.
fn chunk_sum(chunk: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    chunk.chunks_exact(8).fold(0u64, |acc, bytes| {
        word.copy_from_slice(bytes);
        acc.wrapping_add(u64::from_le_bytes(word))
    })
}

/// Compute media-match hashes for multiple files in parallel.
/// Returns a vector of (file_path, hash) tuples.
pub fn media_match_hashes_batch(paths: &[&Path]) -> Vec<(String, Result<String, FsError>)> {
    paths
        .par_iter()
        .map(|path| {
            let path_str = path.to_string_lossy().to_string();
            (path_str, media_match_hash(path))
        })
        .collect()
}

/// Stable cache-file name for a media location: digest of the location and
/// its last-modified time.
pub fn media_unique_name(location: &str, modified: SystemTime) -> String {
    let mtime = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut hasher = Sha256::new();
    hasher.update(location.as_bytes());
    hasher.update(mtime.to_le_bytes());
    format!("{:x}", hasher.finalize())
}
