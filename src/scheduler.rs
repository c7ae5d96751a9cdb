//! 轮询调度器 - 激活时立即 tick 一次，之后按固定间隔 tick
//!
//! 每次 tick 在独立任务中执行：慢 tick 不会阻塞节奏，
//! 停止调度也不会中断正在进行的 tick（它会正常完成并写入状态）。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::notification::SyncEngine;

/// 调度器，每次激活只持有一个定时循环
pub struct PollingScheduler {
    /// 轮询间隔
    interval: Duration,
    /// 定时循环任务
    handle: Option<JoinHandle<()>>,
    /// 本次激活的开关，停止时置 false
    running: Arc<AtomicBool>,
}

impl PollingScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            handle: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some() && self.running.load(Ordering::SeqCst)
    }

    /// 开始调度（需要在 tokio runtime 内调用）
    ///
    /// 已在运行时先停止旧的定时循环，不会泄漏。
    pub fn start(&mut self, engine: Arc<SyncEngine>) {
        self.stop();

        let running = Arc::new(AtomicBool::new(true));
        self.running = running.clone();
        let period = self.interval;
        info!(interval_secs = period.as_secs(), "Starting notification polling");

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                // 第一次立即完成
                ticker.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                let engine = engine.clone();
                let running = running.clone();
                tokio::spawn(async move {
                    if running.load(Ordering::SeqCst) {
                        engine.tick().await;
                    }
                });
            }
        }));
    }

    /// 停止调度
    ///
    /// 之后不会再触发新的 tick。已经在进行的 tick 不会被中断，
    /// 它完成后仍会写入状态。
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Notification polling stopped");
        }
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
