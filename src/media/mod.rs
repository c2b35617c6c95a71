// Modular media processing architecture
//
// This module provides a clean abstraction over the ffmpeg operations the
// toolbox needs:
// - Processor: Main implementation with abstract command building
// - Commands: Command builders and abstractions

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::config::{CropRegion, MediaConfig};
use crate::error::{Result, MedleyError};

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Crop a video to the given region, copying the audio stream
    async fn crop_video(&self, input: &Path, output: &Path, region: &CropRegion) -> Result<()>;

    /// Cut a clip out of a video without re-encoding
    async fn cut_clip(&self, input: &Path, output: &Path, start: f64, duration: f64) -> Result<()>;

    /// Sample frames from a video at the given rate
    async fn extract_frames(&self, input: &Path, output_pattern: &Path, fps: f32) -> Result<()>;

    /// Check if the media processor is available
    fn check_availability(&self) -> Result<()>;

    /// Get media processor version information
    async fn version_info(&self) -> Result<String>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (ffmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}

/// Half-open time range of one clip within a video, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRange {
    pub start: f64,
    pub end: f64,
}

impl ClipRange {
    /// Parse a `START-END` range where each side is `SS`, `MM:SS` or
    /// `HH:MM:SS`.
    pub fn parse(text: &str) -> Result<Self> {
        let (start_text, end_text) = text.split_once('-').ok_or_else(|| {
            MedleyError::Config(format!(
                "Invalid range '{}'. Expected START-END, e.g. 01:30-02:45",
                text
            ))
        })?;

        let start = parse_timestamp(start_text.trim())?;
        let end = parse_timestamp(end_text.trim())?;
        if end <= start {
            return Err(MedleyError::Config(format!(
                "Invalid range '{}': end must be after start",
                text
            )));
        }

        Ok(Self { start, end })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Parse `SS(.fff)`, `MM:SS` or `HH:MM:SS` into seconds.
pub fn parse_timestamp(text: &str) -> Result<f64> {
    let invalid = || MedleyError::Config(format!("Invalid timestamp '{}'", text));

    let parts: Vec<&str> = text.split(':').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(invalid());
    }

    let mut seconds = 0.0;
    for part in &parts {
        let value: f64 = part.parse().map_err(|_| invalid())?;
        if value < 0.0 {
            return Err(invalid());
        }
        seconds = seconds * 60.0 + value;
    }

    Ok(seconds)
}
