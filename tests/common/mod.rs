//! 测试用的 fake 协作者

#![allow(dead_code)]

use admin_notify::auth::{AuthHeaders, MemoryStore};
use admin_notify::notification::{
    AlertCapability, AlertDispatcher, PermissionState, PlatformAlert, SoundCue, SoundSpec,
};
use admin_notify::{
    AuthHeaderProvider, HttpResponse, HttpTransport, NotificationPoller, PollerConfig, SyncEngine,
    TransportError,
};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// 轮询接口的回复
#[derive(Debug, Clone)]
pub enum PollReply {
    Body(Value),
    Status(u16),
    Network,
    Garbage,
}

/// 记录请求并按脚本回复的 fake 服务端
pub struct FakeServer {
    poll: Mutex<PollReply>,
    failing_patches: Mutex<HashSet<String>>,
    patch_log: Mutex<Vec<(String, Value)>>,
    auth_log: Mutex<Vec<String>>,
    gets: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            poll: Mutex::new(PollReply::Body(polling_body(&[], 0))),
            failing_patches: Mutex::new(HashSet::new()),
            patch_log: Mutex::new(Vec::new()),
            auth_log: Mutex::new(Vec::new()),
            gets: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            gate: Mutex::new(None),
        })
    }

    pub fn reply(&self, reply: PollReply) {
        *self.poll.lock().unwrap() = reply;
    }

    pub fn reply_items(&self, items: &[(u64, bool)], unread: u32) {
        self.reply(PollReply::Body(polling_body(items, unread)));
    }

    /// 让指定 URL 后缀的 PATCH 返回 500
    pub fn fail_patch(&self, id: &str) {
        self.failing_patches.lock().unwrap().insert(id.to_string());
    }

    /// 之后的 GET 都会挂起，直到 `release_polls`
    pub fn hold_polls(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn patches(&self) -> Vec<(String, Value)> {
        self.patch_log.lock().unwrap().clone()
    }

    pub fn auth_headers_seen(&self) -> Vec<String> {
        self.auth_log.lock().unwrap().clone()
    }

    pub fn max_concurrent_patches(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for FakeServer {
    async fn get(&self, _url: &str, headers: &AuthHeaders) -> Result<HttpResponse, TransportError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.auth_log
            .lock()
            .unwrap()
            .push(headers.get("Authorization").cloned().unwrap_or_default());

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        let reply = self.poll.lock().unwrap().clone();
        match reply {
            PollReply::Body(body) => Ok(HttpResponse::new(200, body.to_string())),
            PollReply::Status(status) => Ok(HttpResponse::new(status, "{}")),
            PollReply::Network => Err(TransportError::Request("connection refused".to_string())),
            PollReply::Garbage => Ok(HttpResponse::new(200, "<html>oops</html>")),
        }
    }

    async fn patch(
        &self,
        url: &str,
        _headers: &AuthHeaders,
        body: &Value,
    ) -> Result<HttpResponse, TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.patch_log.lock().unwrap().push((url.to_string(), body.clone()));

        tokio::task::yield_now().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let id = url.rsplit('/').next().unwrap_or_default().to_string();
        if self.failing_patches.lock().unwrap().contains(&id) {
            Ok(HttpResponse::new(500, ""))
        } else {
            Ok(HttpResponse::new(200, ""))
        }
    }
}

/// 记录展示过的提醒
pub struct FakeAlerts {
    permission: Mutex<PermissionState>,
    shown: Mutex<Vec<PlatformAlert>>,
}

impl FakeAlerts {
    pub fn new(permission: PermissionState) -> Arc<Self> {
        Arc::new(Self {
            permission: Mutex::new(permission),
            shown: Mutex::new(Vec::new()),
        })
    }

    pub fn tags(&self) -> Vec<String> {
        self.shown.lock().unwrap().iter().map(|a| a.tag.clone()).collect()
    }
}

#[async_trait]
impl AlertCapability for FakeAlerts {
    fn permission(&self) -> PermissionState {
        *self.permission.lock().unwrap()
    }

    async fn request_permission(&self) -> PermissionState {
        let mut permission = self.permission.lock().unwrap();
        *permission = PermissionState::Granted;
        *permission
    }

    fn show(&self, alert: &PlatformAlert) -> Result<()> {
        self.shown.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSound {
    pub plays: AtomicUsize,
}

impl SoundCue for FakeSound {
    fn play(&self, _sound: &SoundSpec) -> Result<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn polling_body(items: &[(u64, bool)], unread: u32) -> Value {
    let notifications: Vec<Value> = items
        .iter()
        .map(|(id, read)| {
            json!({
                "id": id,
                "titulo": format!("Notificación {}", id),
                "mensaje": format!("Detalle {}", id),
                "datos": {"ref": id},
                "leida": read,
            })
        })
        .collect();
    json!({ "notifications": notifications, "unread_count": unread })
}

pub struct Harness {
    pub server: Arc<FakeServer>,
    pub alerts: Arc<FakeAlerts>,
    pub sound: Arc<FakeSound>,
    pub credentials: Arc<MemoryStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            server: FakeServer::new(),
            alerts: FakeAlerts::new(PermissionState::Granted),
            sound: Arc::new(FakeSound::default()),
            credentials: Arc::new(MemoryStore::new().with("token", "secret")),
        }
    }

    pub fn engine(&self) -> SyncEngine {
        let config = PollerConfig::default();
        let dispatcher = AlertDispatcher::new(
            self.alerts.clone(),
            self.sound.clone(),
            config.alert.clone(),
        );
        SyncEngine::new(
            self.server.clone(),
            AuthHeaderProvider::new(self.credentials.clone()),
            dispatcher,
            config,
        )
    }

    pub fn poller(&self) -> NotificationPoller {
        NotificationPoller::new(
            PollerConfig::default(),
            self.server.clone(),
            self.credentials.clone(),
            self.alerts.clone(),
            self.sound.clone(),
        )
    }
}

/// 让已就绪的任务跑完
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
