//! HTTP 传输层
//!
//! 同步引擎只依赖 `HttpTransport` trait，生产环境使用 reqwest 实现。

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::auth::AuthHeaders;

/// 传输层错误（网络、读取响应体失败等）
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP client setup failed: {0}")]
    Setup(String),
    #[error("HTTP request failed: {0}")]
    Request(String),
    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// HTTP 响应（状态码 + 原始响应体）
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 带认证头的 HTTP 客户端
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, headers: &AuthHeaders) -> Result<HttpResponse, TransportError>;

    async fn patch(
        &self,
        url: &str,
        headers: &AuthHeaders,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError>;
}

/// reqwest 实现
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        Ok(Self { client })
    }

    fn apply_headers(
        mut request: reqwest::RequestBuilder,
        headers: &AuthHeaders,
    ) -> reqwest::RequestBuilder {
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request
    }

    async fn execute(request: reqwest::RequestBuilder) -> Result<HttpResponse, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &AuthHeaders) -> Result<HttpResponse, TransportError> {
        let request = Self::apply_headers(self.client.get(url), headers);
        Self::execute(request).await
    }

    async fn patch(
        &self,
        url: &str,
        headers: &AuthHeaders,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        // Content-Type 已由认证头提供
        let request = Self::apply_headers(self.client.patch(url), headers).body(body.to_string());
        Self::execute(request).await
    }
}
