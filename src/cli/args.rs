//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use crate::config::Config;
use crate::health::CertScope;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Site Vitals - 网站可用性与证书过期监控机器人
#[derive(Parser, Debug, Clone)]
#[command(
    name = "site-vitals",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 设置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "设置文件路径 (TOML)",
        env = "SITE_VITALS_SETTINGS"
    )]
    pub settings: Option<PathBuf>,

    /// Telegram机器人令牌
    #[arg(
        long,
        value_name = "TOKEN",
        help = "Telegram机器人令牌",
        env = "SITE_VITALS_BOT_TOKEN",
        hide_env_values = true
    )]
    pub bot_token: Option<String>,

    /// 目标会话ID
    #[arg(
        long,
        value_name = "ID",
        help = "告警与启动消息的目标会话ID",
        env = "SITE_VITALS_CHAT_ID",
        allow_negative_numbers = true
    )]
    pub chat_id: Option<i64>,

    /// 站点快照文件路径
    #[arg(
        long,
        value_name = "FILE",
        help = "站点快照文件路径 [默认: config.json]",
        env = "SITE_VITALS_SNAPSHOT"
    )]
    pub snapshot: Option<PathBuf>,

    /// 证书告警天数
    #[arg(
        long,
        value_name = "DAYS",
        help = "证书剩余天数少于该值时告警 [默认: 10]",
        env = "SITE_VITALS_CERT_ALERT_DAYS"
    )]
    pub cert_alert_days: Option<i64>,

    /// 诊断接口监听地址
    #[arg(
        long,
        value_name = "ADDR",
        help = "诊断接口监听地址 [默认: :6060]",
        env = "SITE_VITALS_DIAG_LISTEN"
    )]
    pub diag_listen: Option<String>,

    /// 检测间隔（秒）
    #[arg(
        short,
        long,
        value_name = "SECONDS",
        help = "检测间隔（秒） [默认: 300]",
        env = "SITE_VITALS_INTERVAL"
    )]
    pub interval: Option<u64>,

    /// 请求超时时间（秒）
    #[arg(
        short,
        long,
        value_name = "SECONDS",
        help = "请求超时时间（秒） [默认: 10]",
        env = "SITE_VITALS_TIMEOUT"
    )]
    pub timeout: Option<u64>,

    /// 证书检查范围
    #[arg(long, value_enum, help = "证书检查范围 [默认: chain]")]
    pub cert_scope: Option<CertScope>,

    /// 日志级别
    #[arg(
        short,
        long,
        value_enum,
        help = "日志级别 [默认: info]",
        env = "SITE_VITALS_LOG_LEVEL"
    )]
    pub log_level: Option<LogLevel>,

    /// 是否输出JSON格式日志
    #[arg(long, help = "输出JSON格式日志")]
    pub json_logs: bool,

    /// 子命令
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum LogLevel {
    /// 跟踪级别
    Trace,
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// 启动监控、命令轮询和诊断接口（默认）
    Run,

    /// 对单个站点执行一次探测和证书检查
    Check {
        /// 站点URL
        #[arg(value_name = "URL", help = "站点URL")]
        url: String,
    },

    /// 打印快照文件中的站点列表
    Sites,

    /// 显示版本信息
    Version,
}

impl Args {
    /// 解析命令行参数
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// 要执行的子命令，未指定时为 `run`
    pub fn selected_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }

    /// 用命令行参数覆盖配置
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(token) = &self.bot_token {
            config.bot_token = token.clone();
        }
        if let Some(chat_id) = self.chat_id {
            config.chat_id = chat_id;
        }
        if let Some(snapshot) = &self.snapshot {
            config.snapshot_path = snapshot.clone();
        }
        if let Some(days) = self.cert_alert_days {
            config.cert_alert_days = days;
        }
        if let Some(listen) = &self.diag_listen {
            config.diag_listen = listen.clone();
        }
        if let Some(interval) = self.interval {
            config.check_interval_seconds = interval;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_seconds = timeout;
        }
        if let Some(scope) = self.cert_scope {
            config.cert_scope = scope;
        }
        if let Some(level) = self.log_level {
            config.log_level = level.to_string();
        }
        if self.json_logs {
            config.log_json = true;
        }
    }
}
