use std::path::Path;
use walkdir::WalkDir;

use crate::batch::BatchItem;
use crate::error::{Result, MedleyError};

/// Video container formats the media commands accept.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "flv", "wmv"];

/// Image formats accepted by the PDF composer.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "webp", "gif"];

/// Enumerate files under `dir` whose extension matches (case-insensitive),
/// down to `max_depth` levels, sorted by path.
pub fn files_with_extensions(dir: &Path, extensions: &[&str], max_depth: usize) -> Result<Vec<BatchItem>> {
    if !dir.is_dir() {
        return Err(MedleyError::FileNotFound(dir.display().to_string()));
    }

    let mut items = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(extension) = entry.path().extension().and_then(|e| e.to_str())
            && extensions.contains(&extension.to_lowercase().as_str())
        {
            items.push(BatchItem::from_path(entry.path()));
        }
    }

    items.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(items)
}

/// Enumerate files under `dir` regardless of extension, down to
/// `max_depth` levels, sorted by path.
pub fn files(dir: &Path, max_depth: usize) -> Result<Vec<BatchItem>> {
    if !dir.is_dir() {
        return Err(MedleyError::FileNotFound(dir.display().to_string()));
    }

    let mut items = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_file() {
            items.push(BatchItem::from_path(entry.path()));
        }
    }

    items.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(items)
}

/// Enumerate the immediate subdirectories of `dir`, sorted by path.
pub fn subdirectories(dir: &Path) -> Result<Vec<BatchItem>> {
    if !dir.is_dir() {
        return Err(MedleyError::FileNotFound(dir.display().to_string()));
    }

    let mut items = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_dir() {
            items.push(BatchItem::from_path(entry.path()));
        }
    }

    items.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(items)
}
