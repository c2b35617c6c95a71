use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use async_trait::async_trait;

use crate::batch::{BatchItem, BatchReport, BatchRunner, ItemOperation, output_for};
use crate::config::{Config, CropRegion};
use crate::dedup::{CopyUniqueOperation, DedupIndex};
use crate::error::{Result, MedleyError};
use crate::media::{ClipRange, MediaProcessorFactory, MediaProcessorTrait};
use crate::merge::{self, MergeSummary};
use crate::pdf::{self, StampOptions};
use crate::scan;

/// Result of one dedup run: the per-candidate report plus the labels that
/// turned out to be duplicates of reference content.
#[derive(Debug)]
pub struct DedupOutcome {
    pub report: BatchReport,
    pub duplicates: Vec<String>,
}

pub struct Toolbox {
    config: Config,
    media: Box<dyn MediaProcessorTrait>,
}

impl Toolbox {
    pub fn new(config: Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        Ok(Self { config, media })
    }

    #[cfg(test)]
    fn with_processor(config: Config, media: Box<dyn MediaProcessorTrait>) -> Self {
        Self { config, media }
    }

    /// Crop every video in `input_dir` to the given region.
    ///
    /// Output defaults to a `cropped` directory inside `input_dir`; the
    /// region defaults to the configured one.
    pub async fn crop_videos(
        &self,
        input_dir: &Path,
        output_dir: Option<&Path>,
        region: Option<CropRegion>,
    ) -> Result<BatchReport> {
        info!("Cropping videos in {}", input_dir.display());

        let items = scan::files_with_extensions(input_dir, scan::VIDEO_EXTENSIONS, 1)?;
        info!("Found {} videos to crop", items.len());

        let output_dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => input_dir.join("cropped"),
        };
        fs::create_dir_all(&output_dir).await?;

        if let Ok(version) = self.media.version_info().await {
            debug!("Using {}", version);
        }

        let operation = CropOperation {
            media: self.media.as_ref(),
            region: region.unwrap_or_else(|| self.config.crop.clone()),
            output_dir,
        };
        let report = BatchRunner::run(items, &operation).await?;
        log_report("crop", &report);
        Ok(report)
    }

    /// Cut one clip per range out of `input`, named `<stem>_clipN.<ext>`.
    pub async fn cut_video(
        &self,
        input: &Path,
        ranges: &[ClipRange],
        output_dir: Option<&Path>,
    ) -> Result<BatchReport> {
        if !input.is_file() {
            return Err(MedleyError::FileNotFound(input.display().to_string()));
        }
        if ranges.is_empty() {
            return Err(MedleyError::Config("No clip ranges given".to_string()));
        }

        let output_dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => input
                .parent()
                .ok_or_else(|| MedleyError::Config("Cannot determine output directory".to_string()))?
                .to_path_buf(),
        };
        fs::create_dir_all(&output_dir).await?;

        let mut clips = HashMap::new();
        let mut items = Vec::with_capacity(ranges.len());
        for (index, range) in ranges.iter().enumerate() {
            let label = format!("clip{}", index + 1);
            clips.insert(label.clone(), *range);
            items.push(BatchItem::new(input, label));
        }

        let operation = CutOperation {
            media: self.media.as_ref(),
            clips,
            output_dir,
        };
        let report = BatchRunner::run(items, &operation).await?;
        log_report("cut", &report);
        Ok(report)
    }

    /// Sample frames from `input` into `output_dir/frame_%05d.png`.
    pub async fn extract_frames(
        &self,
        input: &Path,
        output_dir: &Path,
        fps: f32,
    ) -> Result<PathBuf> {
        if !input.is_file() {
            return Err(MedleyError::FileNotFound(input.display().to_string()));
        }
        if fps <= 0.0 {
            return Err(MedleyError::Config("fps must be positive".to_string()));
        }

        self.media.check_availability()?;
        fs::create_dir_all(output_dir).await?;

        let pattern = output_dir.join("frame_%05d.png");
        self.media.extract_frames(input, &pattern, fps).await?;
        Ok(pattern)
    }

    /// Merge all `extension` files in `input_dir` into one annotated file.
    pub async fn merge_files(
        &self,
        input_dir: &Path,
        output: Option<&Path>,
        extension: &str,
    ) -> Result<MergeSummary> {
        let extension = extension.trim_start_matches('.');
        let output = match output {
            Some(path) => path.to_path_buf(),
            None => input_dir.join(format!("merged_{}.txt", extension)),
        };

        merge::merge_directory(input_dir, &output, extension, self.config.merge.header_width).await
    }

    /// For each subfolder of `root_dir` compose its images into
    /// `<subfolder>/<subfolder>.pdf`.
    pub async fn images_to_pdf(&self, root_dir: &Path) -> Result<BatchReport> {
        info!("Composing PDFs for subfolders of {}", root_dir.display());

        let items = scan::subdirectories(root_dir)?;
        let report = BatchRunner::run(items, &ComposeOperation).await?;
        log_report("images-to-pdf", &report);
        Ok(report)
    }

    /// Stamp page numbers onto every PDF in `root_dir` and its immediate
    /// subfolders, in place.
    pub async fn number_pdfs(
        &self,
        root_dir: &Path,
        font_size: Option<f32>,
        margin: Option<f32>,
    ) -> Result<BatchReport> {
        let items = scan::files_with_extensions(root_dir, &["pdf"], 2)?;
        info!("Numbering {} PDFs under {}", items.len(), root_dir.display());

        let operation = StampOperation {
            options: StampOptions {
                font_size: font_size.unwrap_or(self.config.pdf.number_font_size),
                margin: margin.unwrap_or(self.config.pdf.number_margin),
            },
        };
        let report = BatchRunner::run(items, &operation).await?;
        log_report("number-pdf", &report);
        Ok(report)
    }

    /// Create a `_2up.pdf` companion for every PDF found under `root_dir`.
    pub async fn nup_pdfs(&self, root_dir: &Path) -> Result<BatchReport> {
        let mut items = scan::files_with_extensions(root_dir, &["pdf"], 2)?;
        // Never 2-up an earlier run's output.
        items.retain(|item| !item.label.ends_with("_2up.pdf"));
        info!("Creating 2-up layouts for {} PDFs under {}", items.len(), root_dir.display());

        let report = BatchRunner::run(items, &NupOperation).await?;
        log_report("nup", &report);
        Ok(report)
    }

    /// Copy the files from `candidate_dir` whose content does not already
    /// exist anywhere under `reference_dir` into `output_dir`.
    pub async fn dedup(
        &self,
        reference_dir: &Path,
        candidate_dir: &Path,
        output_dir: &Path,
    ) -> Result<DedupOutcome> {
        let index = DedupIndex::build(reference_dir)?;
        info!("Indexed {} distinct reference files", index.len());

        let items = scan::files(candidate_dir, 1)?;
        fs::create_dir_all(output_dir).await?;

        let operation = CopyUniqueOperation::new(index, output_dir.to_path_buf());
        let report = BatchRunner::run(items, &operation).await?;
        log_report("dedup", &report);

        Ok(DedupOutcome {
            duplicates: operation.into_duplicates(),
            report,
        })
    }
}

fn log_report(command: &str, report: &BatchReport) {
    for result in report.iter() {
        match &result.outcome {
            crate::batch::Outcome::Success(output) => {
                info!("{}: {} -> {}", command, result.item.label, output.display())
            }
            crate::batch::Outcome::Failure(reason) => {
                warn!("{}: {} failed: {}", command, result.item.label, reason)
            }
        }
    }
}

struct CropOperation<'a> {
    media: &'a dyn MediaProcessorTrait,
    region: CropRegion,
    output_dir: PathBuf,
}

#[async_trait]
impl ItemOperation for CropOperation<'_> {
    fn preflight(&self) -> Result<()> {
        self.media.check_availability()
    }

    async fn apply(&self, item: &BatchItem) -> Result<PathBuf> {
        let output = output_for(item, &self.output_dir);
        self.media.crop_video(&item.path, &output, &self.region).await?;
        Ok(output)
    }
}

struct CutOperation<'a> {
    media: &'a dyn MediaProcessorTrait,
    clips: HashMap<String, ClipRange>,
    output_dir: PathBuf,
}

#[async_trait]
impl ItemOperation for CutOperation<'_> {
    fn preflight(&self) -> Result<()> {
        self.media.check_availability()
    }

    async fn apply(&self, item: &BatchItem) -> Result<PathBuf> {
        let range = self
            .clips
            .get(&item.label)
            .ok_or_else(|| MedleyError::Config(format!("Unknown clip '{}'", item.label)))?;

        let stem = item
            .path
            .file_stem()
            .ok_or_else(|| MedleyError::Config("Invalid video filename".to_string()))?
            .to_string_lossy();
        let extension = item
            .path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let output = self
            .output_dir
            .join(format!("{}_{}{}", stem, item.label, extension));
        self.media
            .cut_clip(&item.path, &output, range.start, range.duration())
            .await?;
        Ok(output)
    }
}

/// Composes the images inside one subfolder into `<subfolder>.pdf`.
struct ComposeOperation;

#[async_trait]
impl ItemOperation for ComposeOperation {
    async fn apply(&self, item: &BatchItem) -> Result<PathBuf> {
        let images = scan::files_with_extensions(&item.path, scan::IMAGE_EXTENSIONS, 1)?;
        let paths: Vec<PathBuf> = images.into_iter().map(|image| image.path).collect();

        let output = item.path.join(format!("{}.pdf", item.label));
        pdf::images_to_pdf(&paths, &output)?;
        Ok(output)
    }
}

struct StampOperation {
    options: StampOptions,
}

#[async_trait]
impl ItemOperation for StampOperation {
    async fn apply(&self, item: &BatchItem) -> Result<PathBuf> {
        pdf::stamp_page_numbers(&item.path, &self.options)?;
        Ok(item.path.clone())
    }
}

struct NupOperation;

#[async_trait]
impl ItemOperation for NupOperation {
    async fn apply(&self, item: &BatchItem) -> Result<PathBuf> {
        let stem = item
            .path
            .file_stem()
            .ok_or_else(|| MedleyError::Config("Invalid PDF filename".to_string()))?
            .to_string_lossy();

        let output = item.path.with_file_name(format!("{}_2up.pdf", stem));
        pdf::make_2up(&item.path, &output)?;
        Ok(output)
    }
}
