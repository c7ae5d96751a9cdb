//! 终端提醒能力 - CLI 下的本地通知实现
//!
//! 终端没有通知中心，`ConsoleAlerts` 自己按 tag 合并：
//! 窗口内（默认 120 秒）相同 tag 的提醒只输出一次。

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

use super::alert::{AlertCapability, PermissionState, PlatformAlert, SoundCue, SoundSpec};

/// 终端提醒输出
pub struct ConsoleAlerts {
    /// 最近输出的提醒: tag -> timestamp
    recent: Mutex<HashMap<String, Instant>>,
    /// 合并窗口
    window: Duration,
}

impl ConsoleAlerts {
    pub fn new() -> Self {
        Self {
            recent: Mutex::new(HashMap::new()),
            window: Duration::from_secs(120),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// 记录 tag，返回 `true` 表示应该输出
    fn should_emit(&self, tag: &str, now: Instant) -> bool {
        let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        recent.retain(|_, time| now.duration_since(*time) < self.window);

        if recent.contains_key(tag) {
            debug!(tag = %tag, "Alert coalesced (same tag within window)");
            return false;
        }

        recent.insert(tag.to_string(), now);
        true
    }

    fn render(alert: &PlatformAlert) -> String {
        if alert.body.is_empty() {
            format!("🔔 {}", alert.title)
        } else {
            format!("🔔 {}\n   {}", alert.title, alert.body)
        }
    }
}

impl Default for ConsoleAlerts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertCapability for ConsoleAlerts {
    fn permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    async fn request_permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn show(&self, alert: &PlatformAlert) -> Result<()> {
        if !self.should_emit(&alert.tag, Instant::now()) {
            return Ok(());
        }
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", Self::render(alert))?;
        Ok(())
    }
}

/// 没有本地通知能力（`--no-alerts`）
#[derive(Debug, Default)]
pub struct UnavailableAlerts;

#[async_trait]
impl AlertCapability for UnavailableAlerts {
    fn permission(&self) -> PermissionState {
        PermissionState::Unavailable
    }

    async fn request_permission(&self) -> PermissionState {
        PermissionState::Unavailable
    }

    fn show(&self, _alert: &PlatformAlert) -> Result<()> {
        Err(anyhow!("local alerts unavailable"))
    }
}

/// 终端响铃（音量为 0 时不响）
#[derive(Debug, Default)]
pub struct TerminalBell;

impl SoundCue for TerminalBell {
    fn play(&self, sound: &SoundSpec) -> Result<()> {
        if sound.volume <= 0.0 {
            return Err(anyhow!("sound muted by volume"));
        }
        let mut err = std::io::stderr().lock();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}

/// 静音
#[derive(Debug, Default)]
pub struct Muted;

impl SoundCue for Muted {
    fn play(&self, _sound: &SoundSpec) -> Result<()> {
        Ok(())
    }
}
