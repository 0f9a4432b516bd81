use log::debug;

use super::aggregator::FrameSelection;
use super::error::TranslationError;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// 置信度过滤 - 只保留代表检测置信度严格大于阈值的帧
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceFilter {
    threshold: f64,
}

impl ConfidenceFilter {
    pub fn new(threshold: f64) -> Result<Self, TranslationError> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(TranslationError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn apply(&self, selections: Vec<FrameSelection>) -> Vec<FrameSelection> {
        let before = selections.len();
        let kept: Vec<FrameSelection> = selections
            .into_iter()
            .filter(|s| s.confidence > self.threshold)
            .collect();

        debug!(
            "Confidence filter (> {}): kept {}/{} frames",
            self.threshold,
            kept.len(),
            before
        );
        kept
    }
}

impl Default for ConfidenceFilter {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::translation::detection::SignId;

    fn selection(frame: u64, confidence: f64) -> FrameSelection {
        FrameSelection {
            frame,
            label: SignId::from("oui"),
            confidence,
            source_index: frame as usize,
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let filter = ConfidenceFilter::default();
        let kept = filter.apply(vec![selection(0, 0.6), selection(1, 0.61), selection(2, 0.3)]);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].frame, 1);
    }

    #[test]
    fn test_preserves_order() {
        let filter = ConfidenceFilter::new(0.5).unwrap();
        let kept = filter.apply(vec![selection(1, 0.9), selection(4, 0.2), selection(9, 0.7)]);

        let frames: Vec<u64> = kept.iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![1, 9]);
    }

    #[test]
    fn test_empty_input() {
        assert!(ConfidenceFilter::default().apply(Vec::new()).is_empty());
    }

    #[test]
    fn test_invalid_threshold() {
        assert_eq!(
            ConfidenceFilter::new(1.5).unwrap_err(),
            TranslationError::InvalidThreshold(1.5)
        );
        assert!(ConfidenceFilter::new(f64::NAN).is_err());
        assert!(ConfidenceFilter::new(-0.1).is_err());
        assert!(ConfidenceFilter::new(0.0).is_ok());
    }
}
