//! 响应解析模块
//!
//! 上游返回的是没有版本约定的嵌套数组：
//!
//! ```text
//! [[["Merhaba dünya. ","Hello world. ",null,null,10],["Nasılsın?","How are you?",null,null,10]],null,"en",...]
//! ```
//!
//! 位置 0 是译文片段列表，每个片段的位置 0 是译文、位置 1 是原文；
//! 位置 2 是检测到的源语言。所有结构假设都在这里检查一次，
//! 不符合时立即返回 `MalformedResponse`。

use crate::error::{Result, TranslationError};
use crate::types::TranslatedFragment;
use serde_json::Value;

/// 上游把一个分块再切成的片段
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamSegment {
    pub translated: String,
    pub original: Option<String>,
}

/// 校验后的上游响应
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpstreamPayload {
    pub segments: Vec<UpstreamSegment>,
    pub detected_source_language: Option<String>,
}

impl UpstreamPayload {
    /// 从已解码的 JSON 值构造，检查所有结构假设
    pub fn from_json(value: &Value, chunk_index: usize) -> Result<Self> {
        let malformed = |reason: String| TranslationError::MalformedResponse {
            chunk_index,
            reason,
        };

        let root = value
            .as_array()
            .ok_or_else(|| malformed(format!("expected top-level array, got {}", kind(value))))?;

        let segments = match root.first() {
            None => return Err(malformed("top-level array is empty".to_string())),
            // 空白输入时上游在这里返回 null
            Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    parse_segment(item)
                        .map_err(|reason| malformed(format!("segment {}: {}", i, reason)))
                        .transpose()
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(malformed(format!(
                    "expected segment array at position 0, got {}",
                    kind(other)
                )))
            }
        };

        let detected_source_language = match root.get(2) {
            None | Some(Value::Null) => None,
            Some(Value::String(lang)) if lang.is_empty() => None,
            Some(Value::String(lang)) => Some(lang.clone()),
            Some(other) => {
                return Err(malformed(format!(
                    "expected language string at position 2, got {}",
                    kind(other)
                )))
            }
        };

        Ok(Self {
            segments,
            detected_source_language,
        })
    }

    /// 按顺序拼接所有片段的译文
    pub fn translated_text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.translated.as_str())
            .collect()
    }
}

/// 解析单个片段；译文位置为 null 的片段（如音译行）返回 `None`
fn parse_segment(item: &Value) -> std::result::Result<Option<UpstreamSegment>, String> {
    let fields = item
        .as_array()
        .ok_or_else(|| format!("expected array, got {}", kind(item)))?;

    let translated = match fields.first() {
        None => return Err("segment array is empty".to_string()),
        Some(Value::Null) => return Ok(None),
        Some(Value::String(text)) => text.clone(),
        Some(other) => return Err(format!("expected translated string, got {}", kind(other))),
    };

    let original = match fields.get(1) {
        Some(Value::String(text)) => Some(text.clone()),
        _ => None,
    };

    Ok(Some(UpstreamSegment {
        translated,
        original,
    }))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 解析一个分块的原始响应体
///
/// 只会对正文非空的分块调用，因此解析出空译文时返回 `EmptyTranslation`，
/// 这通常意味着上游以空的成功响应掩盖了拒绝（例如限流）。
pub fn parse(raw_body: &str, expected_index: usize) -> Result<TranslatedFragment> {
    let value: Value =
        serde_json::from_str(raw_body).map_err(|e| TranslationError::MalformedResponse {
            chunk_index: expected_index,
            reason: format!("invalid JSON: {}", e),
        })?;

    let payload = UpstreamPayload::from_json(&value, expected_index)?;
    let text = payload.translated_text();

    if text.trim().is_empty() {
        return Err(TranslationError::EmptyTranslation {
            chunk_index: expected_index,
        });
    }

    Ok(TranslatedFragment {
        index: expected_index,
        text,
        detected_source_language: payload.detected_source_language,
    })
}
