use std::collections::BTreeMap;

use log::debug;

use super::detection::{Detection, SignId};
use super::error::TranslationError;

/// 某一帧的代表检测
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSelection {
    pub frame: u64,
    pub label: SignId,
    pub confidence: f64,
    /// 被选中检测在原始输入中的下标
    pub source_index: usize,
}

impl FrameSelection {
    fn from_detection(index: usize, detection: &Detection) -> Self {
        Self {
            frame: detection.frame,
            label: detection.label.clone(),
            confidence: detection.confidence,
            source_index: index,
        }
    }
}

/// 帧聚合器 - 按帧分组，每帧保留置信度最高的检测
///
/// 置信度相同时保留输入中先出现的那一个；输出按帧号升序。
pub struct FrameAggregator;

impl FrameAggregator {
    pub fn aggregate(detections: &[Detection]) -> Result<Vec<FrameSelection>, TranslationError> {
        let mut best_per_frame: BTreeMap<u64, FrameSelection> = BTreeMap::new();

        for (index, detection) in detections.iter().enumerate() {
            detection
                .validate()
                .map_err(|reason| TranslationError::MalformedDetection { index, reason })?;

            match best_per_frame.get_mut(&detection.frame) {
                Some(current) => {
                    // 严格大于才替换，保证并列时先到先得
                    if detection.confidence > current.confidence {
                        *current = FrameSelection::from_detection(index, detection);
                    }
                }
                None => {
                    best_per_frame.insert(
                        detection.frame,
                        FrameSelection::from_detection(index, detection),
                    );
                }
            }
        }

        debug!(
            "Aggregated {} detections into {} frames",
            detections.len(),
            best_per_frame.len()
        );

        Ok(best_per_frame.into_values().collect())
    }
}
