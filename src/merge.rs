use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, debug};

use crate::error::{Result, MedleyError};

/// Date formats accepted in file-name prefixes, tried in order.
const NAME_DATE_FORMATS: &[(usize, &str)] = &[
    (10, "%Y-%m-%d"),
    (10, "%d-%m-%Y"),
    (8, "%Y%m%d"),
    (10, "%m-%d-%Y"),
];

#[derive(Debug)]
pub struct MergeSummary {
    pub output: PathBuf,
    pub file_count: usize,
}

/// Try to read a date from the beginning of a file name, e.g.
/// `2024-01-15_notes.py` or `20240115_utils.py`.
pub fn extract_date_from_name(name: &str) -> Option<NaiveDate> {
    for (length, format) in NAME_DATE_FORMATS {
        if name.len() < *length || !name.is_char_boundary(*length) {
            continue;
        }
        if let Ok(date) = NaiveDate::parse_from_str(&name[..*length], format) {
            return Some(date);
        }
    }
    None
}

/// Concatenate every `extension` file in `dir` (non-recursive) into
/// `output`, ordered by the date in the file name with the modification
/// time as fallback. Each section gets a numbered header.
pub async fn merge_directory(
    dir: &Path,
    output: &Path,
    extension: &str,
    header_width: usize,
) -> Result<MergeSummary> {
    if !dir.is_dir() {
        return Err(MedleyError::FileNotFound(dir.display().to_string()));
    }

    info!("Merging .{} files from {}", extension, dir.display());

    let wanted = extension.trim_start_matches('.').to_lowercase();
    let mut entries: Vec<(NaiveDateTime, String, PathBuf)> = Vec::new();

    let mut listing = fs::read_dir(dir).await?;
    while let Some(entry) = listing.next_entry().await? {
        let path = entry.path();
        if !path.is_file() || path == output {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.to_lowercase() == wanted);
        if !matches {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let sort_key = match extract_date_from_name(&name) {
            Some(date) => date.and_hms_opt(0, 0, 0).unwrap_or_default(),
            None => {
                let modified = entry.metadata().await?.modified()?;
                DateTime::<Local>::from(modified).naive_local()
            }
        };
        entries.push((sort_key, name, path));
    }

    if entries.is_empty() {
        return Err(MedleyError::Merge(format!(
            "No .{} files found in {}",
            wanted,
            dir.display()
        )));
    }

    entries.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

    let mut merged = String::new();
    for (index, (_, name, path)) in entries.iter().enumerate() {
        debug!("Appending {}", name);
        let content = fs::read_to_string(path).await.map_err(|e| {
            MedleyError::Merge(format!("Failed to read {}: {}", path.display(), e))
        })?;

        merged.push_str(&format!("{:02} - {}\n", index + 1, name));
        merged.push_str(&"#".repeat(header_width));
        merged.push_str("\n\n");
        merged.push_str(&content);
        merged.push_str("\n\n\n");
    }

    fs::write(output, merged).await?;

    info!("Merged {} files into {}", entries.len(), output.display());
    Ok(MergeSummary {
        output: output.to_path_buf(),
        file_count: entries.len(),
    })
}
