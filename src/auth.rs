//! 认证头 - 从凭据存储读取 bearer token 并生成请求头
//!
//! token 读取顺序：
//! 1. 键 `token`
//! 2. 键 `auth_token`
//!
//! 找不到 token 时仍然生成 `Authorization` 头（值为空），由服务端拒绝。

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// token 存储键（按优先级）
pub const TOKEN_KEYS: [&str; 2] = ["token", "auth_token"];

/// 请求头集合
pub type AuthHeaders = BTreeMap<String, String>;

/// 只读键值凭据存储
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// JSON 文件凭据存储（扁平对象，每次读取都重新打开文件）
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 默认路径 `~/.config/admin-notify/credentials.json`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("admin-notify")
            .join("credentials.json")
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl CredentialStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        let value: serde_json::Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Credential file is not valid JSON");
                return None;
            }
        };
        value.get(key).and_then(|v| v.as_str()).map(str::to_string)
    }
}

/// 内存凭据存储（CLI `--token` 和测试使用）
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }
}

/// 认证头生成器（无状态，每次调用都重新读取存储）
#[derive(Clone)]
pub struct AuthHeaderProvider {
    store: Arc<dyn CredentialStore>,
}

impl AuthHeaderProvider {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// 当前 token（空字符串视为不存在）
    pub fn token(&self) -> Option<String> {
        TOKEN_KEYS
            .iter()
            .filter_map(|key| self.store.get(key))
            .find(|token| !token.is_empty())
    }

    /// 生成请求头，不会失败
    pub fn headers(&self) -> AuthHeaders {
        let token = self.token().unwrap_or_default();
        let mut headers = AuthHeaders::new();
        headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }
}
