//! Site Vitals - 网站可用性与证书过期监控机器人
//!
//! 通过聊天机器人管理被监控的网站列表，主要功能：
//! - 周期性HTTP探测和TLS证书过期检查
//! - Telegram告警与聊天命令
//! - JSON快照持久化
//! - 诊断接口和结构化日志

pub mod bot;
pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod notification;
pub mod registry;
pub mod service;
pub mod store;
pub mod web;

// 重新导出主要类型
pub use config::Config;
pub use error::SiteVitalsError;
pub use health::SiteStatus;
pub use registry::{SiteMap, SiteRegistry};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
