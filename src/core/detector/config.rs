use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 使用哪种检测器，由配置显式指定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectorKind {
    /// 固定脚本数据（测试 / 演示）
    Scripted {
        #[serde(default)]
        fixture: Option<PathBuf>,
    },
    /// 带种子的随机模拟，结果可复现
    Seeded { seed: u64 },
    /// YOLOv8 ONNX 模型（需要 `onnx` feature）
    Yolo {
        model_path: PathBuf,
        #[serde(default = "default_input_size")]
        input_size: u32,
        #[serde(default = "default_yolo_confidence")]
        confidence_threshold: f32,
        #[serde(default = "default_nms_threshold")]
        nms_threshold: f32,
    },
}

fn default_input_size() -> u32 {
    640
}

fn default_yolo_confidence() -> f32 {
    0.25
}

fn default_nms_threshold() -> f32 {
    0.45
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// 创建时立即加载
    Eager,
    /// 首次检测时加载
    #[default]
    Lazy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    /// 同一时刻只允许一次推理（运行时非线程安全）
    Exclusive,
    /// 有界线程池；workers = 0 时使用 CPU 核数
    Pool { workers: usize },
}

impl Default for ConcurrencyPolicy {
    fn default() -> Self {
        ConcurrencyPolicy::Exclusive
    }
}

impl ConcurrencyPolicy {
    pub fn worker_count(&self) -> usize {
        match self {
            ConcurrencyPolicy::Exclusive => 1,
            ConcurrencyPolicy::Pool { workers: 0 } => num_cpus::get(),
            ConcurrencyPolicy::Pool { workers } => *workers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub kind: DetectorKind,
    pub load: LoadPolicy,
    pub concurrency: ConcurrencyPolicy,
    pub timeout_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            kind: DetectorKind::Scripted { fixture: None },
            load: LoadPolicy::default(),
            concurrency: ConcurrencyPolicy::default(),
            timeout_ms: 30_000,
        }
    }
}

impl DetectorConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            kind: DetectorKind::Seeded { seed },
            ..Self::default()
        }
    }

    pub fn yolo(model_path: impl Into<PathBuf>) -> Self {
        Self {
            kind: DetectorKind::Yolo {
                model_path: model_path.into(),
                input_size: default_input_size(),
                confidence_threshold: default_yolo_confidence(),
                nms_threshold: default_nms_threshold(),
            },
            load: LoadPolicy::Eager,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
