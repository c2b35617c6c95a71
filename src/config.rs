use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, MedleyError};

fn default_header_width() -> usize {
    60
}

fn default_number_font_size() -> f32 {
    28.0
}

fn default_number_margin() -> f32 {
    50.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub media: MediaConfig,
    pub crop: CropRegion,
    pub merge: MergeConfig,
    pub pdf: PdfConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Additional encoding options appended to every re-encoding command
    /// Common options: ["-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p"]
    pub extra_options: Vec<String>,
}

/// Rectangular crop region in source-video pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Width of the separator line between merged sections
    #[serde(default = "default_header_width")]
    pub header_width: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Font size for stamped page numbers
    #[serde(default = "default_number_font_size")]
    pub number_font_size: f32,
    /// Distance from the bottom edge at which page numbers are placed
    #[serde(default = "default_number_margin")]
    pub number_margin: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                extra_options: vec![
                    // Example encoding options users can customize:
                    // "-preset".to_string(), "medium".to_string(),
                    // "-crf".to_string(), "23".to_string(),
                ],
            },
            crop: CropRegion {
                x: 502,
                y: 100,
                width: 345,
                height: 610,
            },
            merge: MergeConfig {
                header_width: default_header_width(),
            },
            pdf: PdfConfig {
                number_font_size: default_number_font_size(),
                number_margin: default_number_margin(),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MedleyError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| MedleyError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| MedleyError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| MedleyError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.media.binary_path, "ffmpeg");
        assert_eq!(parsed.crop.width, 345);
        assert_eq!(parsed.merge.header_width, 60);
        assert_eq!(parsed.pdf.number_font_size, 28.0);
    }

    #[test]
    fn test_partial_sections_fall_back_to_defaults() {
        let text = r#"
            [media]
            binary_path = "/opt/ffmpeg/bin/ffmpeg"
            extra_options = ["-preset", "fast"]

            [crop]
            x = 0
            y = 0
            width = 1920
            height = 1080

            [merge]

            [pdf]
        "#;

        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.media.binary_path, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.merge.header_width, 60);
        assert_eq!(config.pdf.number_margin, 50.0);
    }
}
