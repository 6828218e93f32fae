//! 客户端配置
//!
//! 优先级从低到高：内置默认值 → YAML 配置文件 → 环境变量 → 命令行参数

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AgentError, AgentResult};
use crate::network::RetryConfig;

/// 默认后端地址
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
/// 固定用户 ID
pub const DEFAULT_USER_ID: &str = "u_999";

/// 后端地址环境变量
pub const ENV_APP_URL: &str = "SAHAYAK_APP_URL";
/// 后端地址备用环境变量
pub const ENV_AGENT_API_URL: &str = "SAHAYAK_AGENT_API_URL";
/// 用户 ID 环境变量
pub const ENV_USER_ID: &str = "SAHAYAK_USER_ID";

/// Agent 客户端配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// 后端地址
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 创建会话时使用的用户 ID
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// 重试配置
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_id: default_user_id(),
            retry: RetryConfig::default(),
        }
    }
}

impl AgentConfig {
    /// 默认值叠加环境变量
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 YAML 文件加载，缺失字段使用默认值
    pub fn from_yaml_file(path: impl AsRef<Path>) -> AgentResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AgentError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
            .map_err(|e| AgentError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_yaml_str(content: &str) -> AgentResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| AgentError::Config(e.to_string()))
    }

    /// 用环境变量覆盖当前值（空值忽略）
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = env_value(ENV_APP_URL).or_else(|| env_value(ENV_AGENT_API_URL)) {
            self.base_url = url;
        }
        if let Some(user_id) = env_value(ENV_USER_ID) {
            self.user_id = user_id;
        }
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// 拼接接口地址，避免出现 `//`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
