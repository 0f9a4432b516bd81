use super::aggregator::FrameSelection;
use super::detection::SignId;

/// 序列去重器 - 相邻重复的手语只保留第一次出现
///
/// 这是游程压缩而不是集合去重：`[a, a, b, a]` → `[a, b, a]`。
pub struct SequenceDeduplicator;

impl SequenceDeduplicator {
    pub fn collapse(selections: &[FrameSelection]) -> Vec<SignId> {
        Self::collapse_labels(selections.iter().map(|s| s.label.clone()).collect())
    }

    pub fn collapse_labels(mut labels: Vec<SignId>) -> Vec<SignId> {
        labels.dedup();
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(labels: &[&str]) -> Vec<SignId> {
        labels.iter().map(|l| SignId::from(*l)).collect()
    }

    #[test]
    fn test_collapses_consecutive_runs() {
        let out = SequenceDeduplicator::collapse_labels(ids(&["merci", "merci", "oui", "oui", "oui"]));
        assert_eq!(out, ids(&["merci", "oui"]));
    }

    #[test]
    fn test_keeps_non_consecutive_repeats() {
        let out = SequenceDeduplicator::collapse_labels(ids(&["oui", "non", "oui"]));
        assert_eq!(out, ids(&["oui", "non", "oui"]));
    }

    #[test]
    fn test_idempotent() {
        let once = SequenceDeduplicator::collapse_labels(ids(&["a", "a", "b", "a", "a", "c", "c"]));
        let twice = SequenceDeduplicator::collapse_labels(once.clone());

        assert_eq!(once, twice);
        assert!(once.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn test_first_of_run_survives() {
        let selections = vec![
            FrameSelection {
                frame: 0,
                label: SignId::from("merci"),
                confidence: 0.8,
                source_index: 0,
            },
            FrameSelection {
                frame: 1,
                label: SignId::from("merci"),
                confidence: 0.9,
                source_index: 1,
            },
        ];

        assert_eq!(SequenceDeduplicator::collapse(&selections), ids(&["merci"]));
    }

    #[test]
    fn test_empty() {
        assert!(SequenceDeduplicator::collapse(&[]).is_empty());
    }
}
