//! 手语检测器适配层
//!
//! 翻译管线只依赖 [`SignDetector`] 的输出契约，不关心检测结果来自真实推理还是脚本数据。
//! 具体实现由配置显式选择，加载失败时不会静默降级为模拟模式。

pub mod config;
pub mod error;
pub mod frames;
mod gate;
pub mod handle;
pub mod scripted;
pub mod seeded;
#[cfg(feature = "onnx")]
pub mod yolo;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::translation::Detection;

pub use config::{ConcurrencyPolicy, DetectorConfig, DetectorKind, LoadPolicy};
pub use error::DetectorError;
pub use handle::{global, install_global, DetectorHandle, DetectorState};
pub use scripted::ScriptedDetector;
pub use seeded::SeededDetector;
#[cfg(feature = "onnx")]
pub use yolo::YoloDetector;

/// 检测输入
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum DetectorSource {
    Image(PathBuf),
    /// 视频：已抽帧的图片目录，按文件名排序
    Video(PathBuf),
}

impl DetectorSource {
    pub fn path(&self) -> &Path {
        match self {
            DetectorSource::Image(path) | DetectorSource::Video(path) => path,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, DetectorSource::Video(_))
    }
}

/// 检测器信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorInfo {
    pub name: String,
    pub model_path: Option<String>,
    pub loaded: bool,
    pub classes_count: usize,
    pub classes: Vec<String>,
}

impl DetectorInfo {
    pub(crate) fn with_catalog(name: &str, model_path: Option<String>, loaded: bool) -> Self {
        let classes: Vec<String> = crate::core::translation::SIGN_CLASSES
            .iter()
            .map(|c| c.to_string())
            .collect();
        Self {
            name: name.to_string(),
            model_path,
            loaded,
            classes_count: classes.len(),
            classes,
        }
    }
}

pub trait SignDetector: Send + Sync {
    /// 对一张图片或一段视频（抽帧目录）运行检测，返回扁平的检测列表
    fn detect(&self, source: &DetectorSource) -> Result<Vec<Detection>, DetectorError>;

    fn info(&self) -> DetectorInfo;
}
