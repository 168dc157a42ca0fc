use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Could not allocate a {width}x{height} drawing surface")]
    Surface { width: u64, height: u64 },

    #[error("Cell {index} is outside a grid of {len} cells")]
    CellOutOfBounds { index: usize, len: usize },

    #[error("PNG encode error: {0}")]
    Encode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PatternError>;
