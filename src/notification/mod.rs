//! 管理员通知同步 - 轮询、对账、本地提醒
//!
//! # 组成
//! 1. `SyncEngine`：唯一持有并写入 `SyncState`，执行 tick 和标记已读
//! 2. `AlertDispatcher`：按权限状态展示本地提醒并播放提示音
//! 3. `ErrorSurface`：展示最近一次轮询错误，5 秒后自动清除
//!
//! # 使用示例
//! ```ignore
//! use admin_notify::notification::{AlertDispatcher, ConsoleAlerts, SyncEngine, TerminalBell};
//!
//! let dispatcher = AlertDispatcher::new(
//!     Arc::new(ConsoleAlerts::new()),
//!     Arc::new(TerminalBell),
//!     config.alert.clone(),
//! );
//! let engine = SyncEngine::new(transport, auth, dispatcher, config);
//! engine.tick().await;
//! println!("unread: {}", engine.snapshot().unread_count);
//! ```

pub mod alert;
pub mod console;
pub mod engine;
pub mod error_surface;
pub mod item;
pub mod state;

pub use alert::{alert_tag, AlertCapability, AlertDispatcher, PermissionState, PlatformAlert, SoundCue, SoundSpec};
pub use console::{ConsoleAlerts, Muted, TerminalBell, UnavailableAlerts};
pub use engine::{new_items, SyncEngine};
pub use error_surface::ErrorSurface;
pub use item::{NotificationId, NotificationItem, PollingResponse};
pub use state::{ErrorRecord, SyncError, SyncState};
