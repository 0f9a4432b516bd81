//! 手语翻译器 - 检测器 + 翻译管线

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use log::{debug, error, info, warn};
use thiserror::Error;

use crate::api::models::{SourceKind, SourceMetadata, TranslationRecord};
use crate::core::config::{ConfigError, TranslatorConfig};
use crate::core::detector::{
    self, DetectorError, DetectorHandle, DetectorInfo, DetectorSource, DetectorState,
};
use crate::core::translation::{Detection, TranslationError, TranslationOutcome, TranslationPipeline};

#[derive(Debug, Error)]
pub enum TranslatorError {
    #[error(transparent)]
    Translation(#[from] TranslationError),
    #[error(transparent)]
    Detector(#[from] DetectorError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Detection JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Outcome JSON encode error: {0}")]
    Encode(#[source] serde_json::Error),
}

enum DetectorBinding {
    Owned(DetectorHandle),
    Global(&'static DetectorHandle),
}

/// 手语翻译器
///
/// ```ignore
/// let translator = SignTranslator::create(TranslatorConfig::load(path)?)?;
/// let record = translator.translate_source(DetectorSource::Image(img), "hello.jpg")?;
/// println!("{}", record.outcome.text);
/// ```
pub struct SignTranslator {
    pipeline: TranslationPipeline,
    detector: DetectorBinding,
}

impl SignTranslator {
    /// 按配置创建翻译器，检测器由翻译器独占
    pub fn create(config: TranslatorConfig) -> Result<Self, TranslatorError> {
        info!("🤟 SignTranslator: initializing");
        crate::init_logging();

        config.validate()?;
        let pipeline = TranslationPipeline::with_translator(config.pipeline.clone(), config.translator())?;
        let handle = DetectorHandle::new(config.detector)?;

        info!("✅ SignTranslator initialized (threshold {})", pipeline.threshold());
        Ok(Self {
            pipeline,
            detector: DetectorBinding::Owned(handle),
        })
    }

    pub fn from_config_file(path: &Path) -> Result<Self, TranslatorError> {
        Self::create(TranslatorConfig::load(path)?)
    }

    /// 共用进程级检测器（需先调用 `detector::install_global`）；`config.detector` 被忽略
    pub fn with_global_detector(config: TranslatorConfig) -> Result<Self, TranslatorError> {
        config.validate()?;
        let pipeline = TranslationPipeline::with_translator(config.pipeline.clone(), config.translator())?;
        Ok(Self {
            pipeline,
            detector: DetectorBinding::Global(detector::global()?),
        })
    }

    /// 注入现成的检测器句柄
    pub fn with_handle(config: TranslatorConfig, handle: DetectorHandle) -> Result<Self, TranslatorError> {
        config.validate()?;
        let pipeline = TranslationPipeline::with_translator(config.pipeline.clone(), config.translator())?;
        Ok(Self {
            pipeline,
            detector: DetectorBinding::Owned(handle),
        })
    }

    fn detector(&self) -> &DetectorHandle {
        match &self.detector {
            DetectorBinding::Owned(handle) => handle,
            DetectorBinding::Global(handle) => *handle,
        }
    }

    /// 直接翻译检测结果（不经过检测器）
    pub fn translate_detections(&self, detections: &[Detection]) -> Result<TranslationOutcome, TranslatorError> {
        Ok(self.pipeline.translate(detections)?)
    }

    /// JSON 检测数组 → JSON 翻译结果
    pub fn translate_json(&self, detections_json: &str) -> Result<String, TranslatorError> {
        let detections: Vec<Detection> = serde_json::from_str(detections_json)?;
        let outcome = self.translate_detections(&detections)?;
        serde_json::to_string(&outcome).map_err(TranslatorError::Encode)
    }

    pub fn translate_batch(&self, batches: &[Vec<Detection>]) -> Vec<Result<TranslationOutcome, TranslatorError>> {
        self.pipeline
            .translate_batch(batches)
            .into_iter()
            .map(|r| r.map_err(TranslatorError::from))
            .collect()
    }

    /// 检测 + 翻译，检测器失败时直接返回错误
    pub fn translate_source(
        &self,
        source: DetectorSource,
        original_name: &str,
    ) -> Result<TranslationRecord, TranslatorError> {
        let start = Instant::now();
        info!("🔍 Detecting signs in {:?}", source.path());

        let detections = self.detector().detect(&source).map_err(|e| {
            error!("❌ Detection failed: {}", e);
            e
        })?;

        self.build_record(&source, original_name, detections, start)
    }

    /// 检测 + 翻译，检测器失败时按“无检测”处理
    pub fn translate_source_or_empty(
        &self,
        source: DetectorSource,
        original_name: &str,
    ) -> Result<TranslationRecord, TranslatorError> {
        let start = Instant::now();

        let detections = match self.detector().detect(&source) {
            Ok(detections) => detections,
            Err(e) => {
                warn!("⚠️ Detection failed, degrading to empty result: {}", e);
                Vec::new()
            }
        };

        self.build_record(&source, original_name, detections, start)
    }

    fn build_record(
        &self,
        source: &DetectorSource,
        original_name: &str,
        detections: Vec<Detection>,
        start: Instant,
    ) -> Result<TranslationRecord, TranslatorError> {
        let outcome = self.pipeline.translate(&detections)?;
        let processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "🎯 '{}' -> \"{}\" ({:.2}%, {} detections, {} ms)",
            original_name,
            outcome.text,
            outcome.aggregate_confidence,
            outcome.detection_count,
            processing_time_ms
        );
        debug!("Detections: {:?}", detections);

        Ok(TranslationRecord {
            source: SourceMetadata {
                original_name: original_name.to_string(),
                kind: SourceKind::from(source),
            },
            detections,
            outcome,
            processing_time_ms,
            created_at: Utc::now(),
        })
    }

    pub fn detector_info(&self) -> DetectorInfo {
        self.detector().info()
    }

    pub fn detector_state(&self) -> DetectorState {
        self.detector().state()
    }
}

impl Drop for SignTranslator {
    fn drop(&mut self) {
        info!("🗑️ SignTranslator: released");
    }
}
