//! Admin Notify - 轮询管理员通知并触发本地提醒

pub mod auth;
pub mod config;
pub mod notification;
pub mod poller;
pub mod scheduler;
pub mod transport;

pub use auth::{AuthHeaderProvider, CredentialStore, JsonFileStore, MemoryStore};
pub use config::{AlertStyle, PollerConfig};
pub use notification::{
    AlertCapability, AlertDispatcher, ErrorRecord, NotificationId, NotificationItem,
    PermissionState, SoundCue, SyncEngine, SyncError, SyncState,
};
pub use poller::NotificationPoller;
pub use scheduler::PollingScheduler;
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
