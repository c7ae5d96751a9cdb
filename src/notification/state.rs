//! 同步状态与错误分类

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::item::NotificationItem;

/// 轮询失败的分类
///
/// `Display` 即展示给用户的消息。
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncError {
    #[error("Unauthorized - check your session")]
    Unauthorized,
    #[error("You do not have administrator permissions")]
    Forbidden,
    #[error("Server error: {status}")]
    ServerError { status: u16 },
    #[error("Connection error")]
    ConnectionError,
}

impl SyncError {
    /// 按 HTTP 状态码分类（仅用于非 2xx 响应）
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => SyncError::Unauthorized,
            403 => SyncError::Forbidden,
            status => SyncError::ServerError { status },
        }
    }
}

/// 当前展示的错误
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub kind: SyncError,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(kind: SyncError) -> Self {
        Self {
            message: kind.to_string(),
            kind,
            raised_at: Utc::now(),
        }
    }
}

/// 本地通知状态，由同步引擎独占写入
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncState {
    /// 规范通知集合（每次成功轮询整体替换）
    pub notifications: Vec<NotificationItem>,
    /// 服务端报告的未读数
    pub unread_count: u32,
    pub is_loading: bool,
    pub last_checked: Option<DateTime<Utc>>,
    pub error: Option<ErrorRecord>,
}

impl SyncState {
    /// 按标识查找条目
    pub fn find(&self, id: &super::item::NotificationId) -> Option<&NotificationItem> {
        self.notifications.iter().find(|n| &n.id == id)
    }

    /// 本地已读标记尚为 false 的条目
    pub fn unread(&self) -> impl Iterator<Item = &NotificationItem> {
        self.notifications.iter().filter(|n| !n.read)
    }
}
