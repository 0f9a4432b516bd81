use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TranslationError {
    #[error("Malformed detection at index {index}: {reason}")]
    MalformedDetection { index: usize, reason: MalformedReason },
    #[error("Invalid confidence threshold: {0} (expected a finite value in [0, 1])")]
    InvalidThreshold(f64),
}

/// 检测记录违反数据约束的具体原因
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MalformedReason {
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
    #[error("bounding box origin ({x}, {y}) is negative or not finite")]
    NegativeOrigin { x: f64, y: f64 },
    #[error("bounding box size {width}x{height} is not positive")]
    NonPositiveSize { width: f64, height: f64 },
}
