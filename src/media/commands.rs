use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::config::CropRegion;
use crate::error::{Result, MedleyError};

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy both streams without re-encoding
    pub fn copy_streams(self) -> Self {
        self.arg("-c").arg("copy")
    }

    /// Copy audio stream
    pub fn copy_audio(self) -> Self {
        self.audio_codec("copy")
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Seek to position (seconds) before reading input
    pub fn seek(self, seconds: f64) -> Self {
        self.arg("-ss").arg(seconds.to_string())
    }

    /// Limit output duration (seconds)
    pub fn duration(self, seconds: f64) -> Self {
        self.arg("-t").arg(seconds.to_string())
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args);

        let output = cmd.output()
            .map_err(|e| MedleyError::Media(format!("Failed to execute media processor: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MedleyError::Media(format!(
                "{} failed: {}",
                self.description,
                stderr
            )));
        }

        Ok(())
    }
}

/// Builder for the media operations used by the toolbox
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Build video cropping command. The audio stream is copied unchanged;
    /// only the video stream is re-encoded.
    pub fn crop_video<P: AsRef<Path>>(
        &self,
        input: P,
        output: P,
        region: &CropRegion,
        extra_options: &[String],
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.binary_path, "Video cropping")
            .overwrite()
            .input(&input)
            .video_filter(format!(
                "crop={}:{}:{}:{}",
                region.width, region.height, region.x, region.y
            ))
            .copy_audio();

        for option in extra_options {
            cmd = cmd.arg(option);
        }

        cmd.output(output)
    }

    /// Build clip cutting command. Stream copy keeps this fast and lossless
    /// at the cost of keyframe-aligned cut points.
    pub fn cut_clip<P: AsRef<Path>>(
        &self,
        input: P,
        output: P,
        start: f64,
        duration: f64,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Clip cutting")
            .overwrite()
            .seek(start)
            .input(input)
            .duration(duration)
            .copy_streams()
            .output(output)
    }

    /// Build frame sampling command
    pub fn extract_frames<P: AsRef<Path>>(
        &self,
        input: P,
        output_pattern: P,
        fps: f32,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Frame extraction")
            .overwrite()
            .input(input)
            .video_filter(format!("fps={}", fps))
            .output(output_pattern)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check")
            .arg("-version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> MediaCommandBuilder {
        MediaCommandBuilder::new("ffmpeg")
    }

    #[test]
    fn test_crop_command_arguments() {
        let region = CropRegion { x: 502, y: 100, width: 345, height: 610 };
        let cmd = builder().crop_video(Path::new("in.mp4"), Path::new("out.mp4"), &region, &[]);

        assert_eq!(
            cmd.args,
            vec![
                "-y", "-i", "in.mp4",
                "-vf", "crop=345:610:502:100",
                "-c:a", "copy",
                "out.mp4",
            ]
        );
    }

    #[test]
    fn test_crop_command_appends_extra_options() {
        let region = CropRegion { x: 0, y: 0, width: 100, height: 100 };
        let extra = vec!["-preset".to_string(), "fast".to_string()];
        let cmd = builder().crop_video(Path::new("in.mp4"), Path::new("out.mp4"), &region, &extra);

        let preset_pos = cmd.args.iter().position(|a| a == "-preset").unwrap();
        assert_eq!(cmd.args[preset_pos + 1], "fast");
        assert_eq!(cmd.args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn test_cut_command_seeks_before_input() {
        let cmd = builder().cut_clip(Path::new("in.mp4"), Path::new("clip.mp4"), 90.0, 30.0);

        assert_eq!(
            cmd.args,
            vec![
                "-y", "-ss", "90",
                "-i", "in.mp4",
                "-t", "30",
                "-c", "copy",
                "clip.mp4",
            ]
        );
    }

    #[test]
    fn test_frame_extraction_command() {
        let cmd = builder().extract_frames(
            Path::new("in.mp4"),
            Path::new("frames/frame_%05d.png"),
            2.0,
        );

        assert!(cmd.args.contains(&"-vf".to_string()));
        assert!(cmd.args.contains(&"fps=2".to_string()));
        assert_eq!(cmd.args.last().unwrap(), "frames/frame_%05d.png");
    }
}
