use log::debug;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::{DetectorError, DetectorInfo, DetectorSource, SignDetector};
use crate::core::translation::{BoundingBox, Detection, SignId, SIGN_CLASSES};

/// 带种子的模拟检测器
///
/// 每次检测都用 `seed` 与输入路径派生一个新的随机数生成器，
/// 同一种子 + 同一路径永远得到相同结果。
#[derive(Debug, Clone)]
pub struct SeededDetector {
    seed: u64,
}

impl SeededDetector {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn rng_for(&self, source: &DetectorSource) -> StdRng {
        let path = source.path().to_string_lossy();
        StdRng::seed_from_u64(self.seed ^ fnv1a(path.as_bytes()))
    }

    /// 图片：1-3 个检测，置信度 0.6-0.95
    fn simulate_image(rng: &mut StdRng) -> Vec<Detection> {
        let count = rng.random_range(1..=3);
        (0..count)
            .map(|_| Self::random_detection(rng, 0.6..0.95, 0))
            .collect()
    }

    /// 视频：10-30 帧，每帧 70% 概率出现 1-2 个检测，置信度 0.5-0.9
    fn simulate_video(rng: &mut StdRng) -> Vec<Detection> {
        let frame_count: u64 = rng.random_range(10..=30);
        let mut detections = Vec::new();

        for frame in 0..frame_count {
            if rng.random_bool(0.7) {
                let count = rng.random_range(1..=2);
                for _ in 0..count {
                    detections.push(Self::random_detection(rng, 0.5..0.9, frame));
                }
            }
        }

        detections
    }

    fn random_detection(rng: &mut StdRng, confidence: std::ops::Range<f64>, frame: u64) -> Detection {
        let label = SIGN_CLASSES.choose(rng).copied().unwrap_or(SIGN_CLASSES[0]);
        let confidence = (rng.random_range(confidence) * 1000.0).round() / 1000.0;
        let bbox = BoundingBox::new(
            rng.random_range(50..=300) as f64,
            rng.random_range(50..=200) as f64,
            rng.random_range(80..=150) as f64,
            rng.random_range(80..=150) as f64,
        );

        Detection::new(SignId::from(label), confidence, bbox, frame)
    }
}

impl SignDetector for SeededDetector {
    fn detect(&self, source: &DetectorSource) -> Result<Vec<Detection>, DetectorError> {
        let mut rng = self.rng_for(source);
        let detections = match source {
            DetectorSource::Image(_) => Self::simulate_image(&mut rng),
            DetectorSource::Video(_) => Self::simulate_video(&mut rng),
        };

        debug!(
            "SeededDetector(seed={}): {} detections for {:?}",
            self.seed,
            detections.len(),
            source.path()
        );
        Ok(detections)
    }

    fn info(&self) -> DetectorInfo {
        DetectorInfo::with_catalog("seeded", None, true)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ b as u64).wrapping_mul(PRIME))
}
