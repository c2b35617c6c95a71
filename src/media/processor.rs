use async_trait::async_trait;
use std::path::Path;
use std::process::Command;
use tracing::{info, debug};

use crate::config::{CropRegion, MediaConfig};
use crate::error::{Result, MedleyError};
use super::{MediaProcessorTrait, MediaCommandBuilder};

/// Concrete implementation of media processor (ffmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    /// Crop a video to the given region, copying the audio stream
    async fn crop_video(&self, input: &Path, output: &Path, region: &CropRegion) -> Result<()> {
        info!("Cropping {} -> {} ({}x{} at {},{})",
              input.display(), output.display(),
              region.width, region.height, region.x, region.y);

        let command = self.command_builder.crop_video(
            input,
            output,
            region,
            &self.config.extra_options,
        );

        command.execute().await?;

        info!("Video cropping completed");
        Ok(())
    }

    /// Cut a clip out of a video without re-encoding
    async fn cut_clip(&self, input: &Path, output: &Path, start: f64, duration: f64) -> Result<()> {
        info!("Cutting {:.1}s from {:.1}s of {} -> {}",
              duration, start, input.display(), output.display());

        let command = self.command_builder.cut_clip(input, output, start, duration);
        command.execute().await?;

        info!("Clip cutting completed");
        Ok(())
    }

    /// Sample frames from a video at the given rate
    async fn extract_frames(&self, input: &Path, output_pattern: &Path, fps: f32) -> Result<()> {
        info!("Extracting frames from {} at {} fps -> {}",
              input.display(), fps, output_pattern.display());

        let command = self.command_builder.extract_frames(input, output_pattern, fps);
        command.execute().await?;

        info!("Frame extraction completed");
        Ok(())
    }

    /// Check if the media processor is available
    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .map_err(|e| MedleyError::Media(format!("Media processor not found: {}", e)))?;

        if output.status.success() {
            info!("Media processor is available");
            Ok(())
        } else {
            Err(MedleyError::Media("Media processor version check failed".to_string()))
        }
    }

    /// Get media processor version information
    async fn version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let output = Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .map_err(|e| MedleyError::Media(format!("Failed to execute media processor: {}", e)))?;

        if output.status.success() {
            let version_info = String::from_utf8_lossy(&output.stdout);
            // Extract the first line which typically contains the version
            let first_line = version_info.lines().next().unwrap_or("Unknown version");
            Ok(first_line.to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(MedleyError::Media(format!("Media processor version check failed: {}", stderr)))
        }
    }
}
