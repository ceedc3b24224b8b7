//! 站点状态码定义
//!
//! 状态码空间：0 未检测、1 连接错误、2 证书即将过期、其余为原始HTTP状态码

use serde::{Deserialize, Serialize};

/// 站点状态码
///
/// 序列化为裸整数，快照文件因此保持 `{"url": code}` 的扁平结构。
/// 内部用 `i64` 存储，手工编辑过的快照里出现负数或超出HTTP范围的值也能载入。
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SiteStatus(i64);

impl SiteStatus {
    /// 新注册，尚未探测
    pub const NEVER_CHECKED: SiteStatus = SiteStatus(0);
    /// 探测时发生传输层错误
    pub const CONNECTION_ERROR: SiteStatus = SiteStatus(1);
    /// 证书在告警阈值内过期
    pub const CERT_EXPIRING: SiteStatus = SiteStatus(2);
    /// HTTP 200
    pub const OK: SiteStatus = SiteStatus(200);

    /// 由原始状态码构造
    pub const fn from_code(code: u16) -> Self {
        SiteStatus(code as i64)
    }

    /// 原始状态码
    pub const fn code(self) -> i64 {
        self.0
    }

    /// 只有恰好为200时才算健康
    pub fn is_healthy(self) -> bool {
        self == Self::OK
    }

    /// 是否为真实观测到的HTTP状态码
    pub fn is_http(self) -> bool {
        (100..=999).contains(&self.0)
    }

    /// 人类可读的状态描述
    pub fn describe(self) -> String {
        match self {
            Self::NEVER_CHECKED => "never checked".to_string(),
            Self::CONNECTION_ERROR => "connection error".to_string(),
            Self::CERT_EXPIRING => "certificate is expiring".to_string(),
            Self::OK => "ok".to_string(),
            other => match u16::try_from(other.0)
                .ok()
                .and_then(|code| reqwest::StatusCode::from_u16(code).ok())
            {
                Some(code) => format!(
                    "HTTP {} {}",
                    other.0,
                    code.canonical_reason().unwrap_or("Unknown")
                ),
                None => format!("HTTP {}", other.0),
            },
        }
    }
}

impl From<u16> for SiteStatus {
    fn from(code: u16) -> Self {
        SiteStatus::from_code(code)
    }
}

impl From<reqwest::StatusCode> for SiteStatus {
    fn from(code: reqwest::StatusCode) -> Self {
        SiteStatus::from_code(code.as_u16())
    }
}

impl std::fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
