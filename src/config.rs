//! 轮询器配置
//!
//! 配置读取优先级：
//! 1. 配置文件 `~/.config/admin-notify/config.json`（不存在则使用默认值）
//! 2. 环境变量 `ADMIN_NOTIFY_BASE_URL` 覆盖 `base_url`

use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::notification::NotificationId;

/// 默认服务端地址
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// 默认轮询间隔（秒）
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// 错误展示时长（秒）
pub const DEFAULT_ERROR_DISPLAY_SECS: u64 = 5;

/// 默认请求超时（秒）
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// 覆盖 base_url 的环境变量
pub const BASE_URL_ENV: &str = "ADMIN_NOTIFY_BASE_URL";

/// 本地提醒的资源和音量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertStyle {
    pub icon: String,
    pub badge: String,
    pub sound: String,
    /// 提示音音量（0.0 - 1.0）
    pub volume: f32,
}

impl Default for AlertStyle {
    fn default() -> Self {
        Self {
            icon: "/admin-icon.png".to_string(),
            badge: "/badge-72x72.png".to_string(),
            sound: "/notification-sound.mp3".to_string(),
            volume: 0.3,
        }
    }
}

/// 轮询器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub base_url: String,
    pub polling_path: String,
    /// 单条通知路径前缀，PATCH 发往 `{item_path}/{id}`
    pub item_path: String,
    pub poll_interval_secs: u64,
    pub error_display_secs: u64,
    pub request_timeout_secs: u64,
    pub alert: AlertStyle,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            polling_path: "/admin/notifications/polling".to_string(),
            item_path: "/admin/notifications".to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            error_display_secs: DEFAULT_ERROR_DISPLAY_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            alert: AlertStyle::default(),
        }
    }
}

impl PollerConfig {
    /// 默认配置文件路径
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("admin-notify")
            .join("config.json")
    }

    /// 从指定文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config.normalized())
    }

    /// 从默认位置和环境变量自动加载
    pub fn auto_load() -> Result<Self> {
        let path = Self::default_path();
        let config = if path.exists() {
            debug!(path = %path.display(), "Loading poller config");
            Self::load(&path)?
        } else {
            Self::default()
        };

        Ok(config.with_env_overrides())
    }

    /// 应用环境变量覆盖
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.is_empty() {
                debug!("Using {} from environment", BASE_URL_ENV);
                self.base_url = url;
            }
        }
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        self.alert.volume = self.alert.volume.clamp(0.0, 1.0);
        self.poll_interval_secs = self.poll_interval_secs.max(1);
        self
    }

    pub fn polling_url(&self) -> String {
        format!("{}{}", self.base_url, self.polling_path)
    }

    /// 单条通知地址，标识作为一个路径段编码
    pub fn item_url(&self, id: &NotificationId) -> Result<String> {
        let base = format!("{}{}", self.base_url, self.item_path.trim_end_matches('/'));
        let mut url = Url::parse(&base).with_context(|| format!("Invalid item URL {}", base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Item URL cannot take path segments: {}", base))?
            .push(id.as_str());
        Ok(url.to_string())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_secs(self.error_display_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
