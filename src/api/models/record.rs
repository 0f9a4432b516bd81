//! 交给存储层的纯数据记录：文件 → 翻译结果 → 单条检测

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::detector::DetectorSource;
use crate::core::translation::{Detection, TranslationOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Image,
    Video,
}

impl From<&DetectorSource> for SourceKind {
    fn from(source: &DetectorSource) -> Self {
        match source {
            DetectorSource::Image(_) => SourceKind::Image,
            DetectorSource::Video(_) => SourceKind::Video,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub original_name: String,
    pub kind: SourceKind,
}

/// 一次请求的完整结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub source: SourceMetadata,
    pub detections: Vec<Detection>,
    pub outcome: TranslationOutcome,
    pub processing_time_ms: u64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::translation::BoundingBox;

    #[test]
    fn test_source_kind_from_detector_source() {
        assert_eq!(
            SourceKind::from(&DetectorSource::Image("a.png".into())),
            SourceKind::Image
        );
        assert_eq!(
            SourceKind::from(&DetectorSource::Video("frames/".into())),
            SourceKind::Video
        );
    }

    #[test]
    fn test_record_json_carries_outcome_and_detections() {
        let record = TranslationRecord {
            source: SourceMetadata {
                original_name: "hello.jpg".to_string(),
                kind: SourceKind::Image,
            },
            detections: vec![Detection::new(
                "bonjour",
                0.9,
                BoundingBox::new(1.0, 2.0, 3.0, 4.0),
                0,
            )],
            outcome: TranslationOutcome {
                text: "Bonjour".to_string(),
                aggregate_confidence: 90.0,
                detection_count: 1,
            },
            processing_time_ms: 12,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["source"]["kind"], "image");
        assert_eq!(value["outcome"]["text"], "Bonjour");
        assert_eq!(value["outcome"]["aggregate_confidence"], 90.0);
        assert_eq!(value["outcome"]["detection_count"], 1);
        assert_eq!(value["detections"][0]["label"], "bonjour");

        let back: TranslationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
