//! 通知轮询器 - 面向调用方的接口
//!
//! 组合 `SyncEngine` 和 `PollingScheduler`：
//! - `activate()`：清空状态，立即轮询一次，之后每 30 秒轮询
//! - `deactivate()`：停止调度，释放错误计时器，清空状态
//! - 读取：`notifications` / `unread_count` / `is_loading` / `last_checked` / `error`
//! - 操作：`mark_as_read` / `mark_all_as_read` / `refresh`

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

use crate::auth::{AuthHeaderProvider, CredentialStore};
use crate::config::PollerConfig;
use crate::notification::{
    AlertCapability, AlertDispatcher, ErrorRecord, NotificationId, NotificationItem, SoundCue,
    SyncEngine, SyncState,
};
use crate::scheduler::PollingScheduler;
use crate::transport::{HttpTransport, ReqwestTransport};

pub struct NotificationPoller {
    engine: Arc<SyncEngine>,
    scheduler: PollingScheduler,
}

impl NotificationPoller {
    /// 用注入的协作者创建
    pub fn new(
        config: PollerConfig,
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialStore>,
        alerts: Arc<dyn AlertCapability>,
        sound: Arc<dyn SoundCue>,
    ) -> Self {
        let dispatcher = AlertDispatcher::new(alerts, sound, config.alert.clone());
        let auth = AuthHeaderProvider::new(credentials);
        let scheduler = PollingScheduler::new(config.poll_interval());
        let engine = Arc::new(SyncEngine::new(transport, auth, dispatcher, config));

        Self { engine, scheduler }
    }

    /// 使用 reqwest 传输层创建
    pub fn with_http(
        config: PollerConfig,
        credentials: Arc<dyn CredentialStore>,
        alerts: Arc<dyn AlertCapability>,
        sound: Arc<dyn SoundCue>,
    ) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);
        Ok(Self::new(config, transport, credentials, alerts, sound))
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// 激活轮询，重复激活不会泄漏旧的定时循环
    pub fn activate(&mut self) {
        self.engine.activate();
        self.scheduler.start(self.engine.clone());
    }

    /// 停用轮询
    pub fn deactivate(&mut self) {
        self.scheduler.stop();
        self.engine.deactivate();
    }

    pub fn is_active(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn state(&self) -> SyncState {
        self.engine.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.engine.subscribe()
    }

    pub fn notifications(&self) -> Vec<NotificationItem> {
        self.engine.snapshot().notifications
    }

    pub fn unread_count(&self) -> u32 {
        self.engine.snapshot().unread_count
    }

    pub fn is_loading(&self) -> bool {
        self.engine.snapshot().is_loading
    }

    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.engine.snapshot().last_checked
    }

    pub fn error(&self) -> Option<ErrorRecord> {
        self.engine.current_error()
    }

    /// 返回服务端是否确认
    pub async fn mark_as_read(&self, id: &NotificationId) -> bool {
        self.engine.mark_as_read(id).await
    }

    pub async fn mark_all_as_read(&self) {
        self.engine.mark_all_as_read().await
    }

    pub async fn refresh(&self) {
        self.engine.refresh().await
    }
}
