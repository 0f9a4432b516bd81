use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::aggregator::{FrameAggregator, FrameSelection};
use super::catalog::LabelTranslator;
use super::deduplicator::SequenceDeduplicator;
use super::detection::Detection;
use super::error::TranslationError;
use super::filter::{ConfidenceFilter, DEFAULT_CONFIDENCE_THRESHOLD};

/// 没有任何手语通过过滤时的固定输出
pub const NO_SIGN_TEXT: &str = "no sign detected";

/// 平均置信度基于哪些帧计算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBasis {
    /// 通过置信度过滤、出现在译文中的帧
    #[default]
    RetainedFrames,
    /// 聚合后的全部帧（包括被过滤掉的帧）
    SelectedFrames,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub confidence_threshold: f64,
    pub confidence_basis: ConfidenceBasis,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            confidence_basis: ConfidenceBasis::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            confidence_threshold: threshold,
            ..Self::default()
        }
    }

    /// 宽松模式 - 实时摄像头场景，接受更多低置信度帧
    pub fn for_live_camera() -> Self {
        Self {
            confidence_threshold: 0.45,
            ..Self::default()
        }
    }

    /// 严格模式 - 上传视频，宁缺毋滥
    pub fn for_uploaded_video() -> Self {
        Self {
            confidence_threshold: 0.75,
            ..Self::default()
        }
    }
}

/// 一次翻译的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationOutcome {
    pub text: String,
    /// 0-100，保留两位小数
    pub aggregate_confidence: f64,
    /// 输入的原始检测数量
    pub detection_count: usize,
}

impl TranslationOutcome {
    pub fn no_sign() -> Self {
        Self {
            text: NO_SIGN_TEXT.to_string(),
            aggregate_confidence: 0.0,
            detection_count: 0,
        }
    }

    pub fn is_no_sign(&self) -> bool {
        self.text == NO_SIGN_TEXT && self.detection_count == 0
    }
}

/// 翻译管线：聚合 → 过滤 → 去重 → 翻译 → 拼接
///
/// 无状态、无 I/O，可在任意线程并发调用。
#[derive(Debug, Clone)]
pub struct TranslationPipeline {
    filter: ConfidenceFilter,
    basis: ConfidenceBasis,
    translator: LabelTranslator,
}

impl TranslationPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, TranslationError> {
        Self::with_translator(config, LabelTranslator::new())
    }

    pub fn with_translator(
        config: PipelineConfig,
        translator: LabelTranslator,
    ) -> Result<Self, TranslationError> {
        Ok(Self {
            filter: ConfidenceFilter::new(config.confidence_threshold)?,
            basis: config.confidence_basis,
            translator,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.filter.threshold()
    }

    pub fn translate(&self, detections: &[Detection]) -> Result<TranslationOutcome, TranslationError> {
        let selections = FrameAggregator::aggregate(detections)?;
        if selections.is_empty() {
            debug!("No detections, returning sentinel outcome");
            return Ok(TranslationOutcome::no_sign());
        }

        let selected_confidence = mean_percent(&selections);
        let retained = self.filter.apply(selections);
        if retained.is_empty() {
            debug!("Every frame fell below the threshold, returning sentinel outcome");
            return Ok(TranslationOutcome::no_sign());
        }

        let aggregate_confidence = match self.basis {
            ConfidenceBasis::RetainedFrames => mean_percent(&retained),
            ConfidenceBasis::SelectedFrames => selected_confidence,
        };

        let sequence = SequenceDeduplicator::collapse(&retained);
        let text = self.translator.translate_sequence(&sequence).join(" ");

        debug!(
            "Translated {} detections -> {} frames -> {} signs: {}",
            detections.len(),
            retained.len(),
            sequence.len(),
            text
        );

        Ok(TranslationOutcome {
            text,
            aggregate_confidence,
            detection_count: detections.len(),
        })
    }

    /// 批量翻译多组互不相关的检测结果（并行）
    pub fn translate_batch(
        &self,
        batches: &[Vec<Detection>],
    ) -> Vec<Result<TranslationOutcome, TranslationError>> {
        let outcomes: Vec<_> = batches.par_iter().map(|d| self.translate(d)).collect();
        info!("🧮 Batch translation complete: {} inputs", outcomes.len());
        outcomes
    }
}

impl Default for TranslationPipeline {
    fn default() -> Self {
        Self {
            filter: ConfidenceFilter::default(),
            basis: ConfidenceBasis::default(),
            translator: LabelTranslator::new(),
        }
    }
}

/// 单次翻译的便捷入口
pub fn translate(detections: &[Detection], threshold: f64) -> Result<TranslationOutcome, TranslationError> {
    TranslationPipeline::new(PipelineConfig::with_threshold(threshold))?.translate(detections)
}

fn mean_percent(selections: &[FrameSelection]) -> f64 {
    if selections.is_empty() {
        return 0.0;
    }
    let sum: f64 = selections.iter().map(|s| s.confidence).sum();
    let percent = sum / selections.len() as f64 * 100.0;
    (percent * 100.0).round() / 100.0
}
