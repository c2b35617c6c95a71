use thiserror::Error;

#[derive(Error, Debug)]
pub enum MedleyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF structure error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Document processing error: {0}")]
    Document(String),

    #[error("Merge error: {0}")]
    Merge(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, MedleyError>;
