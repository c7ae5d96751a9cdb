//! 通知条目 - 轮询接口的数据模型

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// 通知标识
///
/// 服务端可能返回数字或字符串 ID，统一规范为字符串以便比较和集合查找。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NotificationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for NotificationId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for NotificationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => NotificationId::from(n),
            RawId::Text(s) => NotificationId(s),
        })
    }
}

/// 管理员通知条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    /// 唯一标识（跨轮询稳定）
    pub id: NotificationId,
    /// 标题
    #[serde(rename = "titulo")]
    pub title: String,
    /// 正文
    #[serde(rename = "mensaje")]
    pub body: String,
    /// 附加数据，原样转交给提醒分发器
    #[serde(rename = "datos", default)]
    pub payload: serde_json::Value,
    /// 是否已读
    #[serde(rename = "leida", default)]
    pub read: bool,
    /// 通知类型
    #[serde(rename = "tipo", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// 关联链接
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// 创建时间（服务端 ISO8601 字符串，不做解析）
    #[serde(rename = "creada", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl NotificationItem {
    /// 创建简单条目
    pub fn new(id: impl Into<NotificationId>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            payload: serde_json::Value::Null,
            read: false,
            kind: None,
            url: None,
            created_at: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }
}

/// 轮询接口响应：条目按服务端顺序排列，未读数以服务端为准
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingResponse {
    pub notifications: Vec<NotificationItem>,
    pub unread_count: u32,
}
