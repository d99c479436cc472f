//! 传输层模块
//!
//! 翻译核心只通过 `Transport` trait 发送请求，默认实现基于 reqwest。
//! 传输层的任何错误都以 `TransportFailed` 返回，核心不做重试。

use crate::error::{Result, TranslationError};
use crate::request::RequestDescriptor;
use crate::types::TranslationConfig;
use async_trait::async_trait;
use reqwest::{Client, Proxy};
use std::time::Duration;
use tracing::debug;

/// 错误信息中保留的响应体最大长度
const ERROR_BODY_PREVIEW: usize = 200;

/// 发送一个请求描述并返回原始响应体
///
/// 实现必须遵守描述中的超时；并发模式下同一个实例会被多个任务同时使用。
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestDescriptor) -> Result<String>;

    /// 传输层名称，用于日志
    fn name(&self) -> &str {
        "transport"
    }
}

/// 基于 reqwest 的 HTTP 传输层
///
/// 代理在构造时按实例配置设置，之后不可更改。
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// 按配置中的 User-Agent 和代理创建客户端
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(config.max_concurrent_requests.max(1))
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(config.user_agent.clone());

        for (scheme, url) in &config.proxies {
            let proxy = match scheme.as_str() {
                "http" => Proxy::http(url),
                "https" => Proxy::https(url),
                "all" => Proxy::all(url),
                other => {
                    return Err(TranslationError::Config(format!(
                        "unsupported proxy scheme '{}'",
                        other
                    )))
                }
            }
            .map_err(|e| TranslationError::Config(format!("invalid proxy '{}': {}", url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TranslationError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// 使用已有的 reqwest 客户端
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<String> {
        let mut builder = self
            .client
            .get(&request.url)
            .query(&request.query)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!(chunk = request.chunk_index, %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(TranslationError::TransportFailed(format!(
                "HTTP {}: {}",
                status, preview
            )));
        }

        Ok(response.text().await?)
    }

    fn name(&self) -> &str {
        "http"
    }
}
