pub mod config;
pub mod detector;
pub mod translation;

pub use config::{ConfigError, TranslatorConfig};
pub use detector::{DetectorError, DetectorHandle, DetectorSource, SignDetector};
pub use translation::{
    translate, Detection, SignId, TranslationError, TranslationOutcome, TranslationPipeline,
};
