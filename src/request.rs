//! 请求构建模块
//!
//! 把一个分块和合并后的请求参数转换成完整的请求描述。纯转换，不做任何 I/O。

use crate::chunker::Chunk;
use crate::error::{Result, TranslationError};
use crate::types::TranslationRequest;
use std::collections::BTreeMap;
use std::time::Duration;

/// 一次出站请求的完整描述
///
/// 由传输层负责真正发送。`proxies` 与实例配置一致，供自定义传输层使用；
/// 默认的 `HttpTransport` 在构造时已经按同样的配置设置好代理。
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// 对应分块的序号
    pub chunk_index: usize,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub proxies: BTreeMap<String, String>,
}

impl RequestDescriptor {
    /// 取出查询参数的值
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// 请求构建器
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    endpoint: String,
    user_agent: String,
}

impl RequestBuilder {
    pub fn new(endpoint: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            user_agent: user_agent.into(),
        }
    }

    /// 为一个分块构建请求
    ///
    /// 只发送分块的正文，首尾空白由重组阶段放回。
    /// 目标语言为空或格式错误时返回 `InvalidLanguageCode`。
    pub fn build(&self, chunk: &Chunk, request: &TranslationRequest) -> Result<RequestDescriptor> {
        let (source, target) = validate_request(request)?;

        Ok(RequestDescriptor {
            chunk_index: chunk.index,
            url: self.endpoint.clone(),
            query: vec![
                ("client".to_string(), "gtx".to_string()),
                ("sl".to_string(), source.to_string()),
                ("tl".to_string(), target.to_string()),
                ("dt".to_string(), "t".to_string()),
                ("q".to_string(), chunk.body().to_string()),
            ],
            headers: vec![
                ("User-Agent".to_string(), self.user_agent.clone()),
                ("Accept".to_string(), "application/json, text/plain, */*".to_string()),
            ],
            timeout: request.timeout,
            proxies: request.proxies.clone(),
        })
    }
}

/// 检查请求参数中的语言代码，返回规范化后的（源语言，目标语言）
///
/// 源语言为空时视为 "auto"；目标语言不能为空，也不能是 "auto"。
pub fn validate_request(request: &TranslationRequest) -> Result<(&str, &str)> {
    let source = request.source_language.trim();
    let source = if source.is_empty() { "auto" } else { source };
    validate_language_code(source)?;

    let target = request.target_language.trim();
    if target.is_empty() {
        return Err(TranslationError::InvalidLanguageCode(
            "target language is required".to_string(),
        ));
    }
    if target.eq_ignore_ascii_case("auto") {
        return Err(TranslationError::InvalidLanguageCode(
            "target language cannot be 'auto'".to_string(),
        ));
    }
    validate_language_code(target)?;

    Ok((source, target))
}

/// 检查语言代码格式
///
/// 接受 `en`、`zh-CN`、`pt_BR`、`haw` 这样的代码：以字母开头，
/// 只包含 ASCII 字母数字、`-` 和 `_`，长度不超过 16。
pub fn validate_language_code(code: &str) -> Result<()> {
    if code.is_empty() {
        return Err(TranslationError::InvalidLanguageCode(
            "language code is empty".to_string(),
        ));
    }

    let starts_with_letter = code.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid_chars = code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if !starts_with_letter || !valid_chars || code.len() > 16 {
        return Err(TranslationError::InvalidLanguageCode(format!(
            "malformed language code: {:?}",
            code
        )));
    }

    Ok(())
}
