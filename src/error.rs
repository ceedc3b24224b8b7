//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// Site Vitals 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum SiteVitalsError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 探测相关错误
    #[error("探测错误: {0}")]
    Probe(#[from] ProbeError),

    /// 通知相关错误
    #[error("通知错误: {0}")]
    Notification(#[from] NotificationError),

    /// 快照存储错误
    #[error("快照错误: {0}")]
    Store(#[from] StoreError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 探测错误类型
#[derive(Error, Debug)]
pub enum ProbeError {
    /// HTTP请求错误
    #[error("HTTP请求失败: {0}")]
    RequestError(#[from] reqwest::Error),

    /// 超时错误
    #[error("连接超时: {host}")]
    Timeout { host: String },

    /// 连接错误
    #[error("连接失败: {host}: {source}")]
    ConnectionError {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// TLS握手或配置错误
    #[error("TLS错误: {0}")]
    Tls(String),

    /// 证书解析错误
    #[error("证书解析失败: {0}")]
    Certificate(String),

    /// URL无效
    #[error("无效的URL: {0}")]
    InvalidUrl(String),
}

/// 通知错误类型
#[derive(Error, Debug)]
pub enum NotificationError {
    /// 发送失败
    #[error("通知发送失败: {0}")]
    SendError(String),

    /// 模板渲染错误
    #[error("模板渲染失败: {0}")]
    TemplateError(String),

    /// 配置错误
    #[error("通知配置错误: {0}")]
    ConfigError(String),
}

/// 快照存储错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    /// 文件读写失败
    #[error("快照文件读写失败 {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 快照内容无法解析
    #[error("快照内容无效 {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// 快照序列化失败
    #[error("快照序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, SiteVitalsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts_into_top_level() {
        let err: SiteVitalsError = ConfigError::ValidationError("chat_id 不能为0".to_string()).into();
        assert!(err.to_string().contains("chat_id"));
    }

    #[test]
    fn test_store_error_display_contains_path() {
        let err = StoreError::Io {
            path: "/tmp/none/config.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/tmp/none/config.json"));
    }
}
