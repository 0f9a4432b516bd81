//! YOLOv8 ONNX 手语检测器
//!
//! 模型输出 `[1, 4 + num_classes, candidates]`：前 4 行为中心点格式的框，其余为各类别分数。

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{DynamicImage, GenericImageView};
use log::{debug, error, info};
use ndarray::Array;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};

use super::frames::load_frames;
use super::{DetectorError, DetectorInfo, DetectorSource, SignDetector};
use crate::core::translation::{class_label, BoundingBox, Detection, SIGN_CLASSES};

#[derive(Debug, Clone)]
pub struct YoloConfig {
    pub model_path: PathBuf,
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
}

/// 候选框（像素坐标）
#[derive(Debug, Clone)]
struct Candidate {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    class_id: usize,
    confidence: f32,
}

/// ONNX Runtime 会话非线程安全，推理串行执行
pub struct YoloDetector {
    session: Mutex<Session>,
    config: YoloConfig,
}

impl YoloDetector {
    pub fn new(config: YoloConfig) -> Result<Self, DetectorError> {
        if !config.model_path.exists() {
            return Err(DetectorError::ModelLoad(format!(
                "model not found at {:?}",
                config.model_path
            )));
        }

        info!("🔧 Loading YOLOv8 sign model from: {:?}", config.model_path);
        let session = create_session(&config.model_path)?;
        info!(
            "✅ YOLOv8 sign model loaded (input {}x{})",
            config.input_size, config.input_size
        );

        Ok(Self {
            session: Mutex::new(session),
            config,
        })
    }

    pub fn detect_image(&self, img: &DynamicImage, frame: u64) -> Result<Vec<Detection>, DetectorError> {
        let (width, height) = img.dimensions();
        let input = self.preprocess(img)?;
        let (dims, outputs) = self.run_inference(input)?;
        let candidates = self.postprocess(&dims, &outputs, width, height)?;

        Ok(candidates
            .into_iter()
            .map(|c| {
                Detection::new(
                    class_label(c.class_id),
                    c.confidence as f64,
                    BoundingBox::new(c.x as f64, c.y as f64, c.width as f64, c.height as f64),
                    frame,
                )
            })
            .collect())
    }

    /// resize → [0,1] 归一化 → NCHW
    fn preprocess(&self, img: &DynamicImage) -> Result<Value, DetectorError> {
        let size = self.config.input_size;
        let resized = img.resize_exact(size, size, image::imageops::FilterType::Triangle);
        let rgb = resized.to_rgb8();
        let (w, h) = (size as usize, size as usize);

        let mut chw_data: Vec<f32> = Vec::with_capacity(3 * h * w);
        for c in 0..3 {
            for y in 0..h {
                for x in 0..w {
                    let pixel = rgb.get_pixel(x as u32, y as u32);
                    chw_data.push(pixel[c] as f32 / 255.0);
                }
            }
        }

        let shape = vec![1usize, 3, h, w];
        Tensor::from_array((shape, chw_data.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| DetectorError::Inference(format!("Failed to create tensor: {}", e)))
    }

    fn run_inference(&self, input: Value) -> Result<(Vec<i64>, Vec<f32>), DetectorError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectorError::Inference("Session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| DetectorError::Inference(format!("ONNX inference failed: {}", e)))?;

        let output = outputs
            .get("output0")
            .ok_or_else(|| DetectorError::Inference("Missing output0 tensor".to_string()))?;

        let tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::Inference(format!("Failed to extract tensor: {}", e)))?;

        let dims: Vec<i64> = tensor.0.iter().copied().collect();
        Ok((dims, tensor.1.iter().copied().collect()))
    }

    fn postprocess(
        &self,
        dims: &[i64],
        outputs: &[f32],
        orig_width: u32,
        orig_height: u32,
    ) -> Result<Vec<Candidate>, DetectorError> {
        let num_classes = SIGN_CLASSES.len();
        let (num_features, num_boxes) = output_layout(dims, outputs.len())?;

        let output_array = Array::from_shape_vec((num_features, num_boxes), outputs.to_vec())
            .map_err(|e| DetectorError::Inference(format!("Failed to reshape output: {}", e)))?;
        let transposed = output_array.t();

        let input_size = self.config.input_size as f32;
        let scale_w = orig_width as f32 / input_size;
        let scale_h = orig_height as f32 / input_size;
        let mut candidates = Vec::new();

        for i in 0..num_boxes {
            let cx = transposed[[i, 0]];
            let cy = transposed[[i, 1]];
            let w = transposed[[i, 2]];
            let h = transposed[[i, 3]];

            let mut best_class = 0;
            let mut best_score = 0.0f32;
            for c in 0..num_classes {
                let score = transposed[[i, 4 + c]];
                if score > best_score {
                    best_score = score;
                    best_class = c;
                }
            }

            if best_score < self.config.confidence_threshold {
                continue;
            }

            let x = ((cx - w / 2.0) * scale_w).clamp(0.0, orig_width as f32);
            let y = ((cy - h / 2.0) * scale_h).clamp(0.0, orig_height as f32);
            let width = (w * scale_w).min(orig_width as f32 - x);
            let height = (h * scale_h).min(orig_height as f32 - y);

            // 贴边后宽高为 0 的框没有意义
            if width <= 0.0 || height <= 0.0 {
                continue;
            }

            candidates.push(Candidate {
                x,
                y,
                width,
                height,
                class_id: best_class,
                confidence: best_score.min(1.0),
            });
        }

        Ok(non_maximum_suppression(candidates, self.config.nms_threshold))
    }
}

impl SignDetector for YoloDetector {
    fn detect(&self, source: &DetectorSource) -> Result<Vec<Detection>, DetectorError> {
        let frames = load_frames(source)?;
        let mut detections = Vec::new();

        for sampled in &frames {
            match self.detect_image(&sampled.image, sampled.frame) {
                Ok(found) => detections.extend(found),
                Err(e) => {
                    error!("❌ Frame {} inference failed: {}", sampled.frame, e);
                    return Err(e);
                }
            }
        }

        debug!(
            "YOLOv8: {} detections across {} frames",
            detections.len(),
            frames.len()
        );
        Ok(detections)
    }

    fn info(&self) -> DetectorInfo {
        DetectorInfo::with_catalog(
            "yolov8-onnx",
            Some(self.config.model_path.to_string_lossy().into_owned()),
            true,
        )
    }
}

/// 同类别内按置信度做 NMS
fn non_maximum_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Candidate> = Vec::new();
    let mut suppressed = vec![false; candidates.len()];

    for i in 0..candidates.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(candidates[i].clone());

        for j in (i + 1)..candidates.len() {
            if suppressed[j] || candidates[i].class_id != candidates[j].class_id {
                continue;
            }
            if iou(&candidates[i], &candidates[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

fn iou(a: &Candidate, b: &Candidate) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.width * a.height + b.width * b.height - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

fn create_session(model_path: &Path) -> Result<Session, DetectorError> {
    let model_bytes = std::fs::read(model_path)?;

    Session::builder()
        .map_err(|e| DetectorError::ModelLoad(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| DetectorError::ModelLoad(format!("Failed to set optimization level: {}", e)))?
        .commit_from_memory(&model_bytes)
        .map_err(|e| DetectorError::ModelLoad(format!("Failed to load ONNX model: {}", e)))
}

/// 校验 YOLOv8 输出形状 `[1, 4 + 类别数, 候选框数]`，返回 (特征数, 候选框数)
fn output_layout(dims: &[i64], len: usize) -> Result<(usize, usize), DetectorError> {
    let expected_features = 4 + SIGN_CLASSES.len();

    let (features, boxes) = match dims {
        [1, features, boxes] if *features > 0 && *boxes > 0 => (*features as usize, *boxes as usize),
        _ => {
            return Err(DetectorError::Inference(format!(
                "Unexpected output shape {:?}, want [1, {}, N]",
                dims, expected_features
            )))
        }
    };

    if features != expected_features {
        return Err(DetectorError::Inference(format!(
            "Model reports {} classes, catalog has {}",
            features.saturating_sub(4),
            SIGN_CLASSES.len()
        )));
    }
    if features * boxes != len {
        return Err(DetectorError::Inference(format!(
            "Output length {} does not match shape {:?}",
            len, dims
        )));
    }

    Ok((features, boxes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(x: f32, class_id: usize, confidence: f32) -> Candidate {
        Candidate {
            x,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            class_id,
            confidence,
        }
    }

    #[test]
    fn test_nms_suppresses_overlapping_same_class() {
        let kept = non_maximum_suppression(
            vec![candidate(0.0, 1, 0.7), candidate(5.0, 1, 0.9), candidate(300.0, 1, 0.5)],
            0.45,
        );

        assert_eq!(kept.len(), 2);
        assert!((kept[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_nms_keeps_other_classes() {
        let kept = non_maximum_suppression(vec![candidate(0.0, 1, 0.9), candidate(0.0, 2, 0.8)], 0.45);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_iou_identical_boxes() {
        let a = candidate(0.0, 0, 0.9);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
        assert_eq!(iou(&a, &candidate(500.0, 0, 0.9)), 0.0);
    }

    #[test]
    fn test_output_layout_accepts_sign_model() {
        let features = 4 + SIGN_CLASSES.len();
        let (f, n) = output_layout(&[1, features as i64, 8400], features * 8400).unwrap();
        assert_eq!((f, n), (features, 8400));
    }

    #[test]
    fn test_output_layout_rejects_other_class_counts() {
        // COCO 模型：84 个特征，长度恰好也能被 34 整除
        let coco_len = 84 * 34 * 10;
        assert_eq!(coco_len % (4 + SIGN_CLASSES.len()), 0);
        assert!(matches!(
            output_layout(&[1, 84, 340], coco_len),
            Err(DetectorError::Inference(_))
        ));
    }

    #[test]
    fn test_output_layout_rejects_bad_shapes() {
        let features = 4 + SIGN_CLASSES.len();
        assert!(output_layout(&[features as i64, 100], features * 100).is_err());
        assert!(output_layout(&[1, features as i64, 100], features * 99).is_err());
        assert!(output_layout(&[1, features as i64, 0], 0).is_err());
    }

    #[test]
    fn test_missing_model() {
        let result = YoloDetector::new(YoloConfig {
            model_path: PathBuf::from("/nonexistent/signs.onnx"),
            input_size: 640,
            confidence_threshold: 0.25,
            nms_threshold: 0.45,
        });
        assert!(matches!(result, Err(DetectorError::ModelLoad(_))));
    }
}
