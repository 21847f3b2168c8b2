use thiserror::Error;

#[derive(Debug, Error)]
pub enum CardferryError {
    // Carrier dispatch errors
    #[error("Character file not found: {0}")]
    NotFound(String),

    #[error("Unsupported carrier type: {0} (expected .png or .json)")]
    UnsupportedCarrier(String),

    // Parse errors
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    // PNG errors
    #[error("Invalid PNG signature")]
    InvalidPngSignature,

    #[error("PNG chunk error: {0}")]
    PngChunkError(String),

    #[error("Malformed embedded card data: {0}")]
    MalformedEmbeddedData(String),

    // Image pixel errors
    #[error("Image error: {0}")]
    ImageError(String),

    // IO errors
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<serde_json::Error> for CardferryError {
    fn from(err: serde_json::Error) -> Self {
        CardferryError::InvalidJson(err.to_string())
    }
}

impl From<std::io::Error> for CardferryError {
    fn from(err: std::io::Error) -> Self {
        CardferryError::IoError(err.to_string())
    }
}

impl From<image::ImageError> for CardferryError {
    fn from(err: image::ImageError) -> Self {
        CardferryError::ImageError(err.to_string())
    }
}

/// Type alias for Result with CardferryError
pub type Result<T> = std::result::Result<T, CardferryError>;
