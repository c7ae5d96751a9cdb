//! 错误展示 - 保存最近一次轮询错误，到期自动清除
//!
//! 新错误会取代旧错误并重新计时。清除任务带有代号，
//! 旧的清除任务即使已经醒来也不会清掉更新的错误。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use super::state::{ErrorRecord, SyncError, SyncState};

pub struct ErrorSurface {
    state: Arc<watch::Sender<SyncState>>,
    display_window: Duration,
    generation: Arc<AtomicU64>,
    pending_clear: Mutex<Option<JoinHandle<()>>>,
}

impl ErrorSurface {
    pub fn new(state: Arc<watch::Sender<SyncState>>, display_window: Duration) -> Self {
        Self {
            state,
            display_window,
            generation: Arc::new(AtomicU64::new(0)),
            pending_clear: Mutex::new(None),
        }
    }

    /// 展示错误并安排自动清除（需要在 tokio runtime 内调用）
    ///
    /// 展示窗口从调用时刻开始计算。
    pub fn set(&self, error: SyncError) {
        let deadline = Instant::now() + self.display_window;

        // 代号递增和写入错误在同一次状态写入中完成，与清除任务互斥
        let mut generation = 0;
        let current = self.generation.clone();
        self.state.send_modify(|s| {
            generation = current.fetch_add(1, Ordering::SeqCst) + 1;
            s.error = Some(ErrorRecord::new(error));
        });

        let state = self.state.clone();
        let handle = tokio::spawn(async move {
            sleep_until(deadline).await;
            let cleared = state.send_if_modified(|s| {
                current.load(Ordering::SeqCst) == generation && s.error.take().is_some()
            });
            if cleared {
                debug!("Error display window elapsed, cleared");
            }
        });

        self.replace_timer(Some(handle));
    }

    /// 立即清除错误
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.replace_timer(None);
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// 释放清除计时器，不改动状态
    pub fn release(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.replace_timer(None);
    }

    pub fn current(&self) -> Option<ErrorRecord> {
        self.state.borrow().error.clone()
    }

    fn replace_timer(&self, handle: Option<JoinHandle<()>>) {
        let mut pending = self.pending_clear.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = std::mem::replace(&mut *pending, handle) {
            previous.abort();
        }
    }
}

impl Drop for ErrorSurface {
    fn drop(&mut self) {
        self.release();
    }
}
