use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, debug};
use walkdir::WalkDir;

use crate::batch::{output_for, BatchItem, ItemOperation};
use crate::error::{Result, MedleyError};

/// SHA-256 of a file's content, hex-encoded, read in 8 KiB chunks.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Content index of a reference directory: hash -> first path seen with
/// that content.
pub struct DedupIndex {
    hashes: HashMap<String, PathBuf>,
}

impl DedupIndex {
    /// Hash every file under `dir` recursively.
    pub fn build(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(MedleyError::FileNotFound(dir.display().to_string()));
        }

        let files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .collect();

        info!("Indexing {} reference files in {}", files.len(), dir.display());
        let progress = ProgressBar::new(files.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress.set_message("Hashing");

        let mut hashes = HashMap::new();
        for path in files {
            let hash = hash_file(&path)?;
            debug!("{} {}", hash, path.display());
            hashes.entry(hash).or_insert(path);
            progress.inc(1);
        }
        progress.finish_and_clear();

        Ok(Self { hashes })
    }

    pub fn lookup(&self, hash: &str) -> Option<&PathBuf> {
        self.hashes.get(hash)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// Batch operation that copies a candidate file into `output_dir` unless
/// its content already exists in the reference index. Duplicates succeed
/// with the matching reference path as their output and are recorded for
/// the final report.
pub struct CopyUniqueOperation {
    index: DedupIndex,
    output_dir: PathBuf,
    duplicates: Mutex<Vec<String>>,
}

impl CopyUniqueOperation {
    pub fn new(index: DedupIndex, output_dir: PathBuf) -> Self {
        Self {
            index,
            output_dir,
            duplicates: Mutex::new(Vec::new()),
        }
    }

    /// Labels of the candidates that matched reference content, in
    /// processing order.
    pub fn into_duplicates(self) -> Vec<String> {
        self.duplicates.into_inner().unwrap_or_default()
    }
}

#[async_trait]
impl ItemOperation for CopyUniqueOperation {
    async fn apply(&self, item: &BatchItem) -> Result<PathBuf> {
        let hash = hash_file(&item.path)?;

        if let Some(existing) = self.index.lookup(&hash) {
            debug!("Duplicate content: {} == {}", item.path.display(), existing.display());
            if let Ok(mut duplicates) = self.duplicates.lock() {
                duplicates.push(item.label.clone());
            }
            return Ok(existing.clone());
        }

        let destination = output_for(item, &self.output_dir);
        tokio::fs::copy(&item.path, &destination).await?;
        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchRunner;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_hash_file_known_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        fs::write(&path, b"hello").unwrap();

        assert_eq!(
            hash_file(&path).unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_index_is_recursive() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("top.bin"), b"one").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/deep.bin"), b"two").unwrap();

        let index = DedupIndex::build(dir.path()).unwrap();
        assert_eq!(index.len(), 2);
    }

    #[tokio::test]
    async fn test_copies_unique_and_records_duplicates() {
        let reference = tempdir().unwrap();
        fs::write(reference.path().join("known.bin"), b"shared content").unwrap();

        let candidates = tempdir().unwrap();
        fs::write(candidates.path().join("copy.bin"), b"shared content").unwrap();
        fs::write(candidates.path().join("fresh.bin"), b"new content").unwrap();

        let output = tempdir().unwrap();
        let index = DedupIndex::build(reference.path()).unwrap();
        let operation = CopyUniqueOperation::new(index, output.path().to_path_buf());

        let items = vec![
            BatchItem::from_path(candidates.path().join("copy.bin")),
            BatchItem::from_path(candidates.path().join("fresh.bin")),
        ];
        let report = BatchRunner::run(items, &operation).await.unwrap();

        assert_eq!(report.len(), 2);
        assert!(report.all_succeeded());
        assert!(output.path().join("fresh.bin").exists());
        assert!(!output.path().join("copy.bin").exists());
        assert_eq!(operation.into_duplicates(), vec!["copy.bin".to_string()]);
    }
}
