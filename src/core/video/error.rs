use thiserror::Error;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Could not open video: {0}")]
    CannotOpen(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),
}
