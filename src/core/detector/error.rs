use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Detector unavailable: {0}")]
    Unavailable(String),
    #[error("Detection timed out after {0:?}")]
    Timeout(Duration),
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),
    #[error("Model load failed: {0}")]
    ModelLoad(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Fixture parse error: {0}")]
    Fixture(#[from] serde_json::Error),
    #[error("Global detector already installed")]
    AlreadyInstalled,
    #[error("Global detector not installed")]
    NotInstalled,
}

impl DetectorError {
    /// 调用方可以重试或降级处理的错误
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DetectorError::Timeout(_) | DetectorError::Unavailable(_) | DetectorError::Inference(_)
        )
    }
}
