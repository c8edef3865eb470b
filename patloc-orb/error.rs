#[derive(Debug, Clone)]
pub enum BackendError {
    InvalidImageSize { width: usize, height: usize },
    InvalidImageData { expected_len: usize, actual_len: usize },
    InvalidThreshold(u8),
    InvalidPatchSize { patch_size: usize, min_image_dim: usize },
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::InvalidImageSize { width, height } => {
                write!(f, "Invalid image dimensions: {}x{} (must be > 0)", width, height)
            }
            BackendError::InvalidImageData { expected_len, actual_len } => {
                write!(f, "Image data length mismatch: expected {}, got {}", expected_len, actual_len)
            }
            BackendError::InvalidThreshold(t) => {
                write!(f, "Invalid corner threshold: {} (must be 1-127)", t)
            }
            BackendError::InvalidPatchSize { patch_size, min_image_dim } => {
                write!(f, "Patch size {} unusable for minimum image dimension {}", patch_size, min_image_dim)
            }
        }
    }
}

impl std::error::Error for BackendError {}

pub type BackendResult<T> = Result<T, BackendError>;
