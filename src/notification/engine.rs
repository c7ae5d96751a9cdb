//! 通知同步引擎 - 轮询服务端并与本地通知集合对账
//!
//! # 每次 tick
//! 1. 标记 `is_loading`，清除旧错误
//! 2. GET 轮询接口
//! 3. 成功：按标识找出新条目并逐个分发提醒，然后整体替换本地集合和未读数
//! 4. 失败：按 401 / 403 / 其他状态码 / 连接错误分类并展示
//! 5. `is_loading` 复位（drop guard，覆盖所有退出路径）
//!
//! 新条目检测只看标识，不看内容：标识不变的条目即使字段变化也不会再次提醒。
//!
//! 标记已读的请求失败只记录日志，不进入错误展示，也不回滚本地状态。

use chrono::Utc;
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::alert::AlertDispatcher;
use super::error_surface::ErrorSurface;
use super::item::{NotificationId, NotificationItem, PollingResponse};
use super::state::{ErrorRecord, SyncError, SyncState};
use crate::auth::AuthHeaderProvider;
use crate::config::PollerConfig;
use crate::transport::HttpTransport;

/// 找出 `incoming` 中标识不在 `current` 里的条目（保持服务端顺序）
pub fn new_items<'a>(
    current: &HashSet<NotificationId>,
    incoming: &'a [NotificationItem],
) -> Vec<&'a NotificationItem> {
    incoming.iter().filter(|n| !current.contains(&n.id)).collect()
}

/// `is_loading` 复位 guard
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SyncState>,
}

impl<'a> LoadingGuard<'a> {
    fn begin(state: &'a watch::Sender<SyncState>) -> Self {
        state.send_modify(|s| s.is_loading = true);
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.is_loading = false);
    }
}

/// 引擎生命周期：从未激活 / 激活中 / 激活后又停用
const IDLE: u8 = 0;
const ACTIVE: u8 = 1;
const DEACTIVATED: u8 = 2;

/// 同步引擎，`SyncState` 的唯一写入者
pub struct SyncEngine {
    transport: Arc<dyn HttpTransport>,
    auth: AuthHeaderProvider,
    dispatcher: AlertDispatcher,
    config: PollerConfig,
    state: Arc<watch::Sender<SyncState>>,
    errors: ErrorSurface,
    lifecycle: AtomicU8,
}

impl SyncEngine {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        auth: AuthHeaderProvider,
        dispatcher: AlertDispatcher,
        config: PollerConfig,
    ) -> Self {
        let (tx, _rx) = watch::channel(SyncState::default());
        let state = Arc::new(tx);
        let errors = ErrorSurface::new(state.clone(), config.error_display());

        Self {
            transport,
            auth,
            dispatcher,
            config,
            state,
            errors,
            lifecycle: AtomicU8::new(IDLE),
        }
    }

    /// 当前状态快照
    pub fn snapshot(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn current_error(&self) -> Option<ErrorRecord> {
        self.errors.current()
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.load(Ordering::SeqCst) == ACTIVE
    }

    /// 是否在激活后被停用过（从未激活的一次性使用不算）
    pub fn is_deactivated(&self) -> bool {
        self.lifecycle.load(Ordering::SeqCst) == DEACTIVATED
    }

    /// 激活：状态清空
    pub fn activate(&self) {
        self.errors.release();
        self.state.send_replace(SyncState::default());
        self.lifecycle.store(ACTIVE, Ordering::SeqCst);
    }

    /// 停用：释放错误计时器并清空状态
    pub fn deactivate(&self) {
        let _ = self.lifecycle.compare_exchange(
            ACTIVE,
            DEACTIVATED,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        self.errors.release();
        self.state.send_replace(SyncState::default());
    }

    /// 执行一次轮询和对账
    pub async fn tick(&self) {
        let _loading = LoadingGuard::begin(&self.state);
        self.errors.clear();
        debug!("Polling admin notifications");

        match self.fetch().await {
            Ok(response) => self.reconcile(response).await,
            Err(error) => {
                warn!(error = %error, "Notification poll failed");
                self.errors.set(error);
            }
        }

        if self.is_deactivated() {
            debug!("Tick completed after deactivation, state written to an inactive engine");
        }
    }

    /// 计划外立即轮询一次
    pub async fn refresh(&self) {
        self.tick().await
    }

    async fn fetch(&self) -> Result<PollingResponse, SyncError> {
        let headers = self.auth.headers();
        let response = self
            .transport
            .get(&self.config.polling_url(), &headers)
            .await
            .map_err(|e| {
                debug!(error = %e, "Polling request failed");
                SyncError::ConnectionError
            })?;

        if !response.is_success() {
            return Err(SyncError::from_status(response.status));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            debug!(error = %e, "Polling response could not be parsed");
            SyncError::ConnectionError
        })
    }

    async fn reconcile(&self, response: PollingResponse) {
        let current: HashSet<NotificationId> = self
            .state
            .borrow()
            .notifications
            .iter()
            .map(|n| n.id.clone())
            .collect();

        let fresh = new_items(&current, &response.notifications);
        if !fresh.is_empty() {
            info!(count = fresh.len(), "New admin notifications");
        }
        for item in fresh {
            self.dispatcher.dispatch(item).await;
        }

        let PollingResponse {
            notifications,
            unread_count,
        } = response;
        self.state.send_modify(|s| {
            s.notifications = notifications;
            s.unread_count = unread_count;
            s.last_checked = Some(Utc::now());
        });
    }

    /// 标记单条已读
    ///
    /// 服务端确认后才更新本地：条目置为已读，未读数减 1（不低于 0）。
    /// 失败只记录日志。返回服务端是否确认。
    pub async fn mark_as_read(&self, id: &NotificationId) -> bool {
        if !self.patch_read(id).await {
            return false;
        }
        self.state.send_modify(|s| {
            if let Some(item) = s.notifications.iter_mut().find(|n| &n.id == id) {
                item.read = true;
            }
            s.unread_count = s.unread_count.saturating_sub(1);
        });
        true
    }

    /// 标记全部已读
    ///
    /// 逐条顺序发送 PATCH（不并发，限制对服务端的并发压力），
    /// 全部尝试后无条件把本地条目置为已读、未读数置 0。
    pub async fn mark_all_as_read(&self) {
        let unread: Vec<NotificationId> = self
            .state
            .borrow()
            .unread()
            .map(|n| n.id.clone())
            .collect();

        let mut failed = 0usize;
        for id in &unread {
            if !self.patch_read(id).await {
                failed += 1;
            }
        }
        if failed > 0 {
            warn!(failed, total = unread.len(), "Some mark-as-read requests failed");
        }

        self.state.send_modify(|s| {
            for item in s.notifications.iter_mut() {
                item.read = true;
            }
            s.unread_count = 0;
        });
    }

    /// 发送已读 PATCH，返回服务端是否确认
    async fn patch_read(&self, id: &NotificationId) -> bool {
        let url = match self.config.item_url(id) {
            Ok(url) => url,
            Err(e) => {
                warn!(id = %id, error = %e, "Mark-as-read URL could not be built");
                return false;
            }
        };
        let headers = self.auth.headers();
        match self.transport.patch(&url, &headers, &json!({ "read": true })).await {
            Ok(response) if response.is_success() => true,
            Ok(response) => {
                warn!(id = %id, status = response.status, "Mark-as-read rejected by server");
                false
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Mark-as-read request failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[u64]) -> HashSet<NotificationId> {
        values.iter().map(|v| NotificationId::from(*v)).collect()
    }

    fn items(values: &[u64]) -> Vec<NotificationItem> {
        values
            .iter()
            .map(|v| NotificationItem::new(*v, format!("n{}", v), ""))
            .collect()
    }

    #[test]
    fn test_new_items_is_set_difference_in_response_order() {
        let incoming = items(&[5, 3, 9, 1]);
        let fresh = new_items(&ids(&[3, 1, 42]), &incoming);
        let fresh_ids: Vec<&str> = fresh.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(fresh_ids, vec!["5", "9"]);
    }

    #[test]
    fn test_new_items_ignores_content_changes() {
        let mut incoming = items(&[1]);
        incoming[0].title = "changed".to_string();
        incoming[0].read = true;
        assert!(new_items(&ids(&[1]), &incoming).is_empty());
    }

    #[test]
    fn test_new_items_from_empty_state() {
        let incoming = items(&[1, 2]);
        assert_eq!(new_items(&HashSet::new(), &incoming).len(), 2);
    }
}
