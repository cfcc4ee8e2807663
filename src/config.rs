use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppResult, ConfigError, FileError};

/// 程序配置
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// 后端服务地址（不带结尾的 `/`）
    pub api_base_url: String,
    /// 文档分析请求超时（秒）
    pub analyze_timeout_secs: u64,
    /// 问答请求超时（秒）
    pub chat_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3001".to_string(),
            analyze_timeout_secs: 120,
            chat_timeout_secs: 60,
            verbose_logging: false,
        }
    }
}

/// TOML 配置文件的结构，所有字段可缺省
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    api_base_url: Option<String>,
    analyze_timeout_secs: Option<u64>,
    chat_timeout_secs: Option<u64>,
    verbose_logging: Option<bool>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取配置，缺失的字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|e| FileError::read_failed(&display, e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            FileError::TomlParseFailed { source, .. } => FileError::TomlParseFailed {
                path: display,
                source,
            }
            .into(),
            other => other.into(),
        })
    }

    fn from_toml_str(content: &str) -> Result<Self, FileError> {
        let file: FileConfig = toml::from_str(content).map_err(|e| FileError::TomlParseFailed {
            path: String::new(),
            source: e,
        })?;
        let default = Self::default();
        Ok(Self {
            api_base_url: file.api_base_url.unwrap_or(default.api_base_url),
            analyze_timeout_secs: file
                .analyze_timeout_secs
                .unwrap_or(default.analyze_timeout_secs),
            chat_timeout_secs: file.chat_timeout_secs.unwrap_or(default.chat_timeout_secs),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
        })
    }

    /// 加载配置：先读配置文件（如果有），再用环境变量覆盖，最后校验
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(p) => Self::from_toml_file(p)?,
            None => Self::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        Self {
            api_base_url: std::env::var("STUDYAI_API_BASE").unwrap_or(self.api_base_url),
            analyze_timeout_secs: env_parse("STUDYAI_ANALYZE_TIMEOUT_SECS")
                .unwrap_or(self.analyze_timeout_secs),
            chat_timeout_secs: env_parse("STUDYAI_CHAT_TIMEOUT_SECS").unwrap_or(self.chat_timeout_secs),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    /// 校验配置取值
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                key: "api_base_url".to_string(),
                value: self.api_base_url.clone(),
                expected: "http:// 或 https:// 开头的地址".to_string(),
            });
        }
        for (key, value) in [
            ("analyze_timeout_secs", self.analyze_timeout_secs),
            ("chat_timeout_secs", self.chat_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    expected: "大于 0 的秒数".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn analyze_timeout(&self) -> Duration {
        Duration::from_secs(self.analyze_timeout_secs)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }
}

/// 读取并解析环境变量，缺失或无法解析时返回 `None`
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
