//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体和验证逻辑

use crate::health::cert::CertScope;
use crate::health::checker::DEFAULT_PROBE_TIMEOUT;
use crate::health::monitor::{MonitorSettings, DEFAULT_CERT_ALERT_DAYS, DEFAULT_CHECK_INTERVAL};
use crate::notification::telegram::DEFAULT_TELEGRAM_API_URL;
use crate::notification::template::{AlertTemplate, DEFAULT_ALERT_TEMPLATE};
use crate::store::DEFAULT_SNAPSHOT_PATH;
use crate::web::{parse_listen_addr, DEFAULT_DIAG_LISTEN};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Telegram机器人令牌
    pub bot_token: String,
    /// 告警与启动消息的目标会话
    pub chat_id: i64,
    /// 站点快照文件路径
    pub snapshot_path: PathBuf,
    /// 证书剩余天数告警阈值
    pub cert_alert_days: i64,
    /// 诊断接口监听地址
    pub diag_listen: String,
    /// 检测间隔（秒）
    pub check_interval_seconds: u64,
    /// 请求超时时间（秒）
    pub request_timeout_seconds: u64,
    /// 证书检查范围
    pub cert_scope: CertScope,
    /// 告警消息模板
    pub alert_template: String,
    /// Telegram Bot API 地址
    pub telegram_api_url: String,
    /// 日志级别
    pub log_level: String,
    /// 是否输出JSON格式日志
    pub log_json: bool,
    /// 日志文件路径
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: 0,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            cert_alert_days: DEFAULT_CERT_ALERT_DAYS,
            diag_listen: DEFAULT_DIAG_LISTEN.to_string(),
            check_interval_seconds: DEFAULT_CHECK_INTERVAL.as_secs(),
            request_timeout_seconds: DEFAULT_PROBE_TIMEOUT.as_secs(),
            cert_scope: CertScope::default(),
            alert_template: DEFAULT_ALERT_TEMPLATE.to_string(),
            telegram_api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            log_level: "info".to_string(),
            log_json: false,
            log_file: None,
        }
    }
}

impl Config {
    /// 检测间隔
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    /// 请求超时时间
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// 监控循环设置
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            interval: self.check_interval(),
            cert_alert_days: self.cert_alert_days,
        }
    }

    /// 日志级别过滤器，无法识别时退回 info
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.bot_token.trim().is_empty() {
        return Err("必须提供Telegram机器人令牌 (bot_token)".to_string());
    }

    if config.chat_id == 0 {
        return Err("必须提供非零的会话ID (chat_id)".to_string());
    }

    if config.check_interval_seconds == 0 {
        return Err("检测间隔不能为0".to_string());
    }

    if config.request_timeout_seconds == 0 {
        return Err("请求超时时间不能为0".to_string());
    }

    if config.cert_alert_days < 0 {
        return Err(format!(
            "证书告警天数不能为负数: {}",
            config.cert_alert_days
        ));
    }

    if config.snapshot_path.as_os_str().is_empty() {
        return Err("快照文件路径不能为空".to_string());
    }

    // 验证日志级别
    let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.log_level, valid_log_levels
        ));
    }

    parse_listen_addr(&config.diag_listen)?;

    if !config.telegram_api_url.starts_with("http://")
        && !config.telegram_api_url.starts_with("https://")
    {
        return Err(format!(
            "Telegram API 地址格式无效: {}",
            config.telegram_api_url
        ));
    }

    AlertTemplate::new(&config.alert_template).map_err(|e| e.to_string())?;

    Ok(())
}
