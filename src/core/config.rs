use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::detector::{DetectorConfig, DetectorKind};
use super::translation::{ConfidenceFilter, LabelTranslator, PipelineConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] json5::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 翻译器整体配置（JSON5）
///
/// ```json5
/// {
///   pipeline: { confidence_threshold: 0.6, confidence_basis: "retained_frames" },
///   detector: {
///     kind: { type: "yolo", model_path: "models/signs.onnx" },
///     load: "eager",
///     concurrency: { mode: "exclusive" },
///     timeout_ms: 15000,
///   },
///   catalog_overrides: { merci: "Merci beaucoup" },
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub pipeline: PipelineConfig,
    pub detector: DetectorConfig,
    pub catalog_overrides: HashMap<String, String>,
}

impl TranslatorConfig {
    pub fn from_json5_str(text: &str) -> Result<Self, ConfigError> {
        let config: TranslatorConfig = json5::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("⚙️ Loading translator config from {:?}", path);
        let text = fs::read_to_string(path)?;
        Self::from_json5_str(&text)
    }

    /// 测试 / 演示用：带种子的模拟检测器
    pub fn for_simulation(seed: u64) -> Self {
        Self {
            detector: DetectorConfig::seeded(seed),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfidenceFilter::new(self.pipeline.confidence_threshold)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.detector.timeout_ms == 0 {
            return Err(ConfigError::Invalid("detector.timeout_ms must be positive".to_string()));
        }

        if let DetectorKind::Yolo {
            input_size,
            confidence_threshold,
            nms_threshold,
            ..
        } = &self.detector.kind
        {
            if *input_size == 0 || input_size % 32 != 0 {
                return Err(ConfigError::Invalid(format!(
                    "detector input_size {} must be a positive multiple of 32",
                    input_size
                )));
            }
            for (name, value) in [("confidence_threshold", confidence_threshold), ("nms_threshold", nms_threshold)] {
                if !(0.0..=1.0).contains(value) {
                    return Err(ConfigError::Invalid(format!(
                        "detector {} {} is outside [0, 1]",
                        name, value
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn translator(&self) -> LabelTranslator {
        LabelTranslator::with_overrides(self.catalog_overrides.clone())
    }
}
