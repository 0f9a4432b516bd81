//! 检测器生命周期管理
//!
//! 状态：`Unloaded` → `Ready` | `Unavailable(原因)`。
//! 加载失败会被记住，之后的调用直接返回 `Unavailable`，只有显式 `reload()` 才会重试。
//! 每次检测都在有界线程池中执行并受超时约束，超时从任务开始执行时计时。
//! 超时任务占满所有 worker 时，新调用立即返回 busy（`Unavailable`）。

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{error, info, warn};
use once_cell::sync::OnceCell;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::config::{DetectorConfig, DetectorKind, LoadPolicy};
use super::gate::{JobTicket, WorkerGate};
use super::scripted::ScriptedDetector;
use super::seeded::SeededDetector;
use super::{DetectorError, DetectorInfo, DetectorSource, SignDetector};
use crate::core::translation::Detection;

static GLOBAL_DETECTOR: OnceCell<DetectorHandle> = OnceCell::new();

/// 对外可见的生命周期状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorState {
    Unloaded,
    Ready,
    Unavailable(String),
}

enum Slot {
    Unloaded,
    Ready(Arc<dyn SignDetector>),
    Unavailable(String),
}

pub struct DetectorHandle {
    config: DetectorConfig,
    slot: Mutex<Slot>,
    pool: ThreadPool,
    gate: Arc<WorkerGate>,
}

impl DetectorHandle {
    /// 按配置创建；`LoadPolicy::Eager` 时立即加载模型
    pub fn new(config: DetectorConfig) -> Result<Self, DetectorError> {
        let handle = Self {
            pool: build_pool(&config)?,
            gate: Arc::new(WorkerGate::new(config.concurrency.worker_count())),
            slot: Mutex::new(Slot::Unloaded),
            config,
        };

        if handle.config.load == LoadPolicy::Eager {
            let state = handle.reload();
            info!("🧠 Detector eager load finished: {:?}", state);
        }

        Ok(handle)
    }

    /// 注入现成的检测器实现（跳过加载阶段）
    pub fn with_detector(
        detector: Arc<dyn SignDetector>,
        config: DetectorConfig,
    ) -> Result<Self, DetectorError> {
        Ok(Self {
            pool: build_pool(&config)?,
            gate: Arc::new(WorkerGate::new(config.concurrency.worker_count())),
            slot: Mutex::new(Slot::Ready(detector)),
            config,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn state(&self) -> DetectorState {
        match &*self.lock_slot() {
            Slot::Unloaded => DetectorState::Unloaded,
            Slot::Ready(_) => DetectorState::Ready,
            Slot::Unavailable(reason) => DetectorState::Unavailable(reason.clone()),
        }
    }

    /// 丢弃当前实例并重新加载
    pub fn reload(&self) -> DetectorState {
        let mut slot = self.lock_slot();
        *slot = load_slot(&self.config.kind);
        match &*slot {
            Slot::Ready(_) => DetectorState::Ready,
            Slot::Unavailable(reason) => DetectorState::Unavailable(reason.clone()),
            Slot::Unloaded => DetectorState::Unloaded,
        }
    }

    pub fn info(&self) -> DetectorInfo {
        match &*self.lock_slot() {
            Slot::Ready(detector) => detector.info(),
            Slot::Unloaded | Slot::Unavailable(_) => {
                DetectorInfo::with_catalog(kind_name(&self.config.kind), model_path(&self.config.kind), false)
            }
        }
    }

    /// 运行检测（带超时）。超时属于可恢复错误，后台推理结果会被丢弃。
    pub fn detect(&self, source: &DetectorSource) -> Result<Vec<Detection>, DetectorError> {
        let detector = self.ensure_loaded()?;
        let timeout = self.config.timeout();
        self.gate.acquire()?;

        let (started_tx, started_rx) = mpsc::channel();
        let (tx, rx) = mpsc::channel();
        let ticket = Arc::new(JobTicket::default());
        let job_ticket = Arc::clone(&ticket);
        let gate = Arc::clone(&self.gate);
        let job_source = source.clone();

        self.pool.spawn(move || {
            let _ = started_tx.send(());
            let result = panic::catch_unwind(AssertUnwindSafe(|| detector.detect(&job_source)))
                .unwrap_or_else(|_| Err(DetectorError::Inference("detector panicked".to_string())));
            gate.release(&job_ticket);
            let _ = tx.send(result);
        });

        // 已持有许可，池中必有空闲线程
        if started_rx.recv().is_err() {
            return Err(DetectorError::Inference(
                "detection worker exited before starting".to_string(),
            ));
        }

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!("⏱️ Detection timed out after {:?} for {:?}", timeout, source.path());
                self.gate.abandon(&ticket);
                Err(DetectorError::Timeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(DetectorError::Inference(
                "detection worker exited without a result".to_string(),
            )),
        }
    }

    fn ensure_loaded(&self) -> Result<Arc<dyn SignDetector>, DetectorError> {
        let mut slot = self.lock_slot();
        if matches!(*slot, Slot::Unloaded) {
            info!("🧠 Lazy-loading detector on first use");
            *slot = load_slot(&self.config.kind);
        }

        match &*slot {
            Slot::Ready(detector) => Ok(Arc::clone(detector)),
            Slot::Unavailable(reason) => Err(DetectorError::Unavailable(reason.clone())),
            Slot::Unloaded => Err(DetectorError::Unavailable("detector not loaded".to_string())),
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        // 持锁期间不会 panic（推理在线程池中执行），中毒时直接沿用内部状态
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for DetectorHandle {
    fn drop(&mut self) {
        info!("🗑️ DetectorHandle: releasing detector");
    }
}

/// 安装进程级检测器（只能安装一次）
pub fn install_global(config: DetectorConfig) -> Result<&'static DetectorHandle, DetectorError> {
    let handle = DetectorHandle::new(config)?;
    GLOBAL_DETECTOR
        .set(handle)
        .map_err(|_| DetectorError::AlreadyInstalled)?;
    global()
}

pub fn global() -> Result<&'static DetectorHandle, DetectorError> {
    GLOBAL_DETECTOR.get().ok_or(DetectorError::NotInstalled)
}

fn build_pool(config: &DetectorConfig) -> Result<ThreadPool, DetectorError> {
    let workers = config.concurrency.worker_count().max(1);
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("sign-detector-{}", i))
        .build()
        .map_err(|e| DetectorError::Unavailable(format!("failed to start detector workers: {}", e)))
}

fn load_slot(kind: &DetectorKind) -> Slot {
    match build_detector(kind) {
        Ok(detector) => {
            info!("✅ Detector '{}' ready", detector.info().name);
            Slot::Ready(detector)
        }
        Err(e) => {
            error!("❌ Detector load failed: {}", e);
            Slot::Unavailable(e.to_string())
        }
    }
}

fn build_detector(kind: &DetectorKind) -> Result<Arc<dyn SignDetector>, DetectorError> {
    match kind {
        DetectorKind::Scripted { fixture: Some(path) } => {
            Ok(Arc::new(ScriptedDetector::from_fixture_file(path)?))
        }
        DetectorKind::Scripted { fixture: None } => Ok(Arc::new(ScriptedDetector::new())),
        DetectorKind::Seeded { seed } => Ok(Arc::new(SeededDetector::new(*seed))),
        #[cfg(feature = "onnx")]
        DetectorKind::Yolo {
            model_path,
            input_size,
            confidence_threshold,
            nms_threshold,
        } => {
            let config = super::yolo::YoloConfig {
                model_path: model_path.clone(),
                input_size: *input_size,
                confidence_threshold: *confidence_threshold,
                nms_threshold: *nms_threshold,
            };
            Ok(Arc::new(super::yolo::YoloDetector::new(config)?))
        }
        #[cfg(not(feature = "onnx"))]
        DetectorKind::Yolo { model_path, .. } => Err(DetectorError::ModelLoad(format!(
            "cannot load {:?}: built without the `onnx` feature",
            model_path
        ))),
    }
}

fn kind_name(kind: &DetectorKind) -> &'static str {
    match kind {
        DetectorKind::Scripted { .. } => "scripted",
        DetectorKind::Seeded { .. } => "seeded",
        DetectorKind::Yolo { .. } => "yolov8-onnx",
    }
}

fn model_path(kind: &DetectorKind) -> Option<String> {
    match kind {
        DetectorKind::Yolo { model_path, .. } => Some(model_path.to_string_lossy().into_owned()),
        _ => None,
    }
}
