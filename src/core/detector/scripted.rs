use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::{DetectorError, DetectorInfo, DetectorSource, SignDetector};
use crate::core::translation::Detection;

/// 脚本检测器 - 按输入路径返回固定的检测结果
///
/// 用于测试和演示，输出完全确定。
#[derive(Debug, Clone, Default)]
pub struct ScriptedDetector {
    fixtures: HashMap<PathBuf, Vec<Detection>>,
    fallback: Option<Vec<Detection>>,
}

impl ScriptedDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 任何输入都返回同一组检测
    pub fn with_fixed_detections(detections: Vec<Detection>) -> Self {
        Self {
            fixtures: HashMap::new(),
            fallback: Some(detections),
        }
    }

    pub fn with_fixture(mut self, path: impl Into<PathBuf>, detections: Vec<Detection>) -> Self {
        self.fixtures.insert(path.into(), detections);
        self
    }

    /// 从 JSON 文件加载：`{ "path/to/input": [detection, ...], ... }`
    pub fn from_fixture_file(path: &Path) -> Result<Self, DetectorError> {
        let content = fs::read_to_string(path)?;
        let fixtures: HashMap<PathBuf, Vec<Detection>> = serde_json::from_str(&content)?;
        info!(
            "📜 ScriptedDetector: loaded {} fixtures from {:?}",
            fixtures.len(),
            path
        );
        Ok(Self {
            fixtures,
            fallback: None,
        })
    }

    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }
}

impl SignDetector for ScriptedDetector {
    fn detect(&self, source: &DetectorSource) -> Result<Vec<Detection>, DetectorError> {
        if let Some(detections) = self.fixtures.get(source.path()) {
            return Ok(detections.clone());
        }

        match &self.fallback {
            Some(detections) => Ok(detections.clone()),
            None => {
                debug!("No fixture for {:?}, returning no detections", source.path());
                Ok(Vec::new())
            }
        }
    }

    fn info(&self) -> DetectorInfo {
        DetectorInfo::with_catalog("scripted", None, true)
    }
}
