//! 配置管理模块
//!
//! 提供TOML配置文件的读取、写入和自动发现功能。

use crate::error::Result;
use crate::types::TranslationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// 自动发现配置文件时依次尝试的文件名
pub const DEFAULT_CONFIG_FILES: [&str; 3] = [
    "translation-config.toml",
    "config.toml",
    ".translation-config.toml",
];

/// 翻译库配置结构
///
/// 包含所有翻译相关的配置选项，支持从TOML文件加载和保存。
///
/// # 示例
///
/// ```rust,no_run
/// use chunked_translate::TranslationLibConfig;
///
/// // 从默认位置加载配置
/// let config = TranslationLibConfig::load_from_default_locations();
///
/// // 从指定文件加载配置
/// let config = TranslationLibConfig::from_file("config.toml").unwrap();
///
/// // 保存配置到文件
/// config.save_to_file("output.toml").unwrap();
/// ```
///
/// ```toml
/// [translation]
/// source_language = "auto"
/// target_language = "tr"
/// timeout_secs = 5.0
/// max_chunk_size = 5000
/// max_concurrent_requests = 4
///
/// [translation.proxies]
/// https = "http://proxy.example.com:8080"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationLibConfig {
    /// 翻译配置
    #[serde(default)]
    pub translation: TranslationConfig,
}

impl TranslationLibConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TranslationLibConfig = toml::from_str(content)?;
        config.translation.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from the default file names in the working directory
    pub fn load_from_default_locations() -> Self {
        Self::load_from_dir(Path::new("."))
    }

    /// Load configuration from the first default file name found in `dir`
    pub fn load_from_dir(dir: &Path) -> Self {
        for name in &DEFAULT_CONFIG_FILES {
            let path = dir.join(name);
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        info!(path = %path.display(), "loaded translation configuration");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to load translation configuration");
                    }
                }
            }
        }

        info!("no translation configuration file found, using defaults");
        Self::default()
    }

    /// Generate example configuration file
    pub fn generate_example_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let example_config = Self {
            translation: TranslationConfig::for_target("en"),
        };
        example_config.save_to_file(path)?;
        Ok(())
    }
}
