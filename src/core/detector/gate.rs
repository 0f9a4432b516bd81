//! 推理工作线程的准入控制
//!
//! 许可数与线程池大小一致：拿到许可才提交任务，因此任务提交后立即开始执行。
//! 超时的任务仍占用许可（被标记为 abandoned），直到推理真正结束；
//! 当全部许可都被 abandoned 任务占用时，新调用立即返回 busy，而不是排队等待。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};

use log::warn;

use super::DetectorError;

#[derive(Debug, Default)]
struct GateState {
    running: usize,
    abandoned: usize,
}

/// 单个任务的状态，只在持有 gate 锁时修改
#[derive(Debug, Default)]
pub(crate) struct JobTicket {
    finished: AtomicBool,
    abandoned: AtomicBool,
}

#[derive(Debug)]
pub(crate) struct WorkerGate {
    limit: usize,
    state: Mutex<GateState>,
    freed: Condvar,
}

impl WorkerGate {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            state: Mutex::new(GateState::default()),
            freed: Condvar::new(),
        }
    }

    /// 等待空闲 worker；正常运行中的任务都受超时约束，所以等待是有界的
    pub(crate) fn acquire(&self) -> Result<(), DetectorError> {
        let mut state = self.lock_state();
        loop {
            if state.abandoned >= self.limit {
                warn!("🚧 All {} detector workers are stuck on timed-out jobs", self.limit);
                return Err(DetectorError::Unavailable(format!(
                    "detector busy: {} worker(s) still running timed-out jobs",
                    state.abandoned
                )));
            }
            if state.running < self.limit {
                state.running += 1;
                return Ok(());
            }
            state = self
                .freed
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// 任务结束（无论调用方是否已超时）
    pub(crate) fn release(&self, ticket: &JobTicket) {
        let mut state = self.lock_state();
        ticket.finished.store(true, Ordering::Relaxed);
        state.running = state.running.saturating_sub(1);
        if ticket.abandoned.load(Ordering::Relaxed) {
            state.abandoned = state.abandoned.saturating_sub(1);
        }
        self.freed.notify_all();
    }

    /// 调用方超时放弃等待；任务若已结束则无需记账
    pub(crate) fn abandon(&self, ticket: &JobTicket) {
        let mut state = self.lock_state();
        if !ticket.finished.load(Ordering::Relaxed) {
            ticket.abandoned.store(true, Ordering::Relaxed);
            state.abandoned += 1;
            self.freed.notify_all();
        }
    }

    #[cfg(test)]
    fn counts(&self) -> (usize, usize) {
        let state = self.lock_state();
        (state.running, state.abandoned)
    }

    fn lock_state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_up_to_limit() {
        let gate = WorkerGate::new(2);
        gate.acquire().unwrap();
        gate.acquire().unwrap();
        assert_eq!(gate.counts(), (2, 0));

        gate.release(&JobTicket::default());
        assert_eq!(gate.counts(), (1, 0));
    }

    #[test]
    fn test_abandoned_jobs_make_gate_busy() {
        let gate = WorkerGate::new(1);
        let ticket = JobTicket::default();

        gate.acquire().unwrap();
        gate.abandon(&ticket);
        assert_eq!(gate.counts(), (1, 1));
        assert!(matches!(gate.acquire(), Err(DetectorError::Unavailable(_))));

        gate.release(&ticket);
        assert_eq!(gate.counts(), (0, 0));
        assert!(gate.acquire().is_ok());
    }

    #[test]
    fn test_abandon_after_finish_is_ignored() {
        let gate = WorkerGate::new(1);
        let ticket = JobTicket::default();

        gate.acquire().unwrap();
        gate.release(&ticket);
        gate.abandon(&ticket);
        assert_eq!(gate.counts(), (0, 0));
    }
}
