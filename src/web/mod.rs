//! 诊断接口模块
//!
//! 在诊断地址上提供存活检查、站点列表和运行状态

pub mod handlers;
pub mod server;

use crate::health::CycleReport;
use crate::registry::SiteRegistry;
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

pub use server::DiagnosticsServer;

/// 默认诊断监听地址
pub const DEFAULT_DIAG_LISTEN: &str = ":6060";

/// 诊断接口共享状态
#[derive(Debug, Clone)]
pub struct DiagnosticsState {
    /// 站点注册表
    pub registry: SiteRegistry,
    /// 最近一轮检测报告
    pub last_report: Arc<RwLock<Option<CycleReport>>>,
    /// 启动时间
    pub start_time: DateTime<Utc>,
}

impl DiagnosticsState {
    /// 创建新的诊断状态
    pub fn new(registry: SiteRegistry, last_report: Arc<RwLock<Option<CycleReport>>>) -> Self {
        Self {
            registry,
            last_report,
            start_time: Utc::now(),
        }
    }
}

/// 解析监听地址，`:6060` 形式表示监听所有接口
pub fn parse_listen_addr(listen: &str) -> Result<SocketAddr, String> {
    let listen = listen.trim();
    let normalized = if listen.starts_with(':') {
        format!("0.0.0.0{}", listen)
    } else {
        listen.to_string()
    };

    normalized
        .parse()
        .map_err(|e| format!("无效的监听地址 {}: {}", listen, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listen_addr() {
        assert_eq!(
            parse_listen_addr(":6060").unwrap(),
            "0.0.0.0:6060".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_listen_addr("127.0.0.1:9000").unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
        assert!(parse_listen_addr("localhost").is_err());
    }
}
