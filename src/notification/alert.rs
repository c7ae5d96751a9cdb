//! 提醒分发器 - 通过平台本地通知能力展示新通知
//!
//! # 流程
//! 1. 平台能力不可用 -> 直接返回
//! 2. 权限未决定 -> 请求权限（等待用户响应）
//! 3. 权限未授予 -> 直接返回
//! 4. 展示提醒（tag = `admin-{id}`，同一 tag 由平台合并）
//! 5. 尝试播放提示音，失败只记录日志
//!
//! 分发器不返回错误，所有失败都在内部吞掉。

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::item::{NotificationId, NotificationItem};
use crate::config::AlertStyle;

/// 平台通知权限状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// 平台没有本地通知能力
    Unavailable,
    /// 尚未询问用户
    Undetermined,
    Denied,
    Granted,
}

/// 平台提醒
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformAlert {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// 合并键，由通知标识派生
    pub tag: String,
    pub data: serde_json::Value,
}

impl PlatformAlert {
    pub fn for_item(item: &NotificationItem, style: &AlertStyle) -> Self {
        Self {
            title: item.title.clone(),
            body: item.body.clone(),
            icon: style.icon.clone(),
            badge: style.badge.clone(),
            tag: alert_tag(&item.id),
            data: item.payload.clone(),
        }
    }
}

/// 由通知标识生成提醒 tag
pub fn alert_tag(id: &NotificationId) -> String {
    format!("admin-{}", id)
}

/// 提示音
#[derive(Debug, Clone, PartialEq)]
pub struct SoundSpec {
    pub source: String,
    pub volume: f32,
}

impl From<&AlertStyle> for SoundSpec {
    fn from(style: &AlertStyle) -> Self {
        Self {
            source: style.sound.clone(),
            volume: style.volume,
        }
    }
}

/// 平台本地通知能力
#[async_trait]
pub trait AlertCapability: Send + Sync {
    /// 当前权限状态
    fn permission(&self) -> PermissionState;

    /// 请求权限，返回用户决定后的状态
    async fn request_permission(&self) -> PermissionState;

    /// 展示提醒（相同 tag 应被合并而不是叠加）
    fn show(&self, alert: &PlatformAlert) -> Result<()>;
}

/// 提示音播放能力（尽力而为）
pub trait SoundCue: Send + Sync {
    fn play(&self, sound: &SoundSpec) -> Result<()>;
}

/// 提醒分发器
#[derive(Clone)]
pub struct AlertDispatcher {
    alerts: Arc<dyn AlertCapability>,
    sound: Arc<dyn SoundCue>,
    style: AlertStyle,
}

impl AlertDispatcher {
    pub fn new(alerts: Arc<dyn AlertCapability>, sound: Arc<dyn SoundCue>, style: AlertStyle) -> Self {
        Self { alerts, sound, style }
    }

    /// 分发一条通知，永不失败
    pub async fn dispatch(&self, item: &NotificationItem) {
        let mut permission = self.alerts.permission();
        if permission == PermissionState::Unavailable {
            debug!(id = %item.id, "Local alerts unavailable, skipping");
            return;
        }

        if permission == PermissionState::Undetermined {
            permission = self.alerts.request_permission().await;
            debug!(?permission, "Alert permission requested");
        }

        if permission != PermissionState::Granted {
            debug!(id = %item.id, ?permission, "Alert permission not granted, skipping");
            return;
        }

        let alert = PlatformAlert::for_item(item, &self.style);
        if let Err(e) = self.alerts.show(&alert) {
            debug!(tag = %alert.tag, error = %e, "Alert emission failed");
        }

        if let Err(e) = self.sound.play(&SoundSpec::from(&self.style)) {
            debug!(error = %e, "Sound cue unavailable");
        }
    }
}
