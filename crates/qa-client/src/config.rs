//! 客户端配置模块

use std::time::Duration;

/// 后端默认地址
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// API 客户端配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// 后端基础地址（不含结尾的 `/`）
    pub base_url: String,

    /// 请求超时，`None` 表示使用运行时默认值
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// 创建新的配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置后端地址
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// 设置请求超时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::new();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ClientConfig::new()
            .with_base_url("http://example.com:9000/")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.base_url, "http://example.com:9000");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }
}
