//! 手语检测结果 → 文本翻译管线
//!
//! 数据流（纯函数，无 I/O）：
//! 1. 帧聚合 - 每帧选出置信度最高的检测
//! 2. 置信度过滤 - 丢弃低于阈值的帧
//! 3. 序列去重 - 合并相邻重复的手语
//! 4. 词表翻译 - SignId → 显示文本

pub mod aggregator;
pub mod catalog;
pub mod deduplicator;
pub mod detection;
pub mod error;
pub mod filter;
pub mod pipeline;

pub use aggregator::{FrameAggregator, FrameSelection};
pub use catalog::{class_label, LabelTranslator, SIGN_CLASSES};
pub use deduplicator::SequenceDeduplicator;
pub use detection::{BoundingBox, Detection, SignId};
pub use error::{MalformedReason, TranslationError};
pub use filter::{ConfidenceFilter, DEFAULT_CONFIDENCE_THRESHOLD};
pub use pipeline::{
    translate, ConfidenceBasis, PipelineConfig, TranslationOutcome, TranslationPipeline,
    NO_SIGN_TEXT,
};
