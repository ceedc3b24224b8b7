//! 日志系统模块
//!
//! 提供结构化日志配置和管理功能

use crate::config::Config;
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 默认压低的依赖库日志级别
const QUIET_MODULES: &[(&str, LevelFilter)] = &[
    ("hyper", LevelFilter::Warn),
    ("hyper_util", LevelFilter::Warn),
    ("reqwest", LevelFilter::Warn),
    ("rustls", LevelFilter::Warn),
    ("handlebars", LevelFilter::Warn),
];

/// 全局日志初始化状态
#[derive(Debug, Default)]
struct GlobalLoggingState {
    /// 是否已初始化
    initialized: bool,
    /// 当前配置
    current_config: Option<LogConfig>,
}

/// 全局日志状态管理器
static GLOBAL_LOGGING_STATE: OnceLock<Mutex<GlobalLoggingState>> = OnceLock::new();

/// 日志配置结构
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: LevelFilter,
    /// 日志文件路径，设置后写入文件而不是控制台
    pub file_path: Option<PathBuf>,
    /// 是否使用JSON格式
    pub json_format: bool,
    /// 模块级别日志控制
    pub module_levels: Vec<(String, LevelFilter)>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file_path: None,
            json_format: false,
            module_levels: QUIET_MODULES
                .iter()
                .map(|(module, level)| (module.to_string(), *level))
                .collect(),
        }
    }
}

impl LogConfig {
    /// 从应用配置构造日志配置
    pub fn from_config(config: &Config) -> Self {
        Self {
            level: config.log_level_filter(),
            file_path: config.log_file.clone(),
            json_format: config.log_json,
            ..Self::default()
        }
    }
}

/// 日志系统
#[derive(Debug)]
pub struct LoggingSystem {
    config: LogConfig,
}

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// 进程内只会真正初始化一次，重复调用返回新的句柄
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        let state_mutex =
            GLOBAL_LOGGING_STATE.get_or_init(|| Mutex::new(GlobalLoggingState::default()));
        let mut state = state_mutex
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !state.initialized {
            Self::init_log_tracer()?;
            Self::init_tracing_subscriber(&config)?;
            state.initialized = true;
            state.current_config = Some(config.clone());
        }

        Ok(Self { config })
    }

    /// 当前句柄对应的配置
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// 初始化 LogTracer（log crate 到 tracing 的桥接）
    fn init_log_tracer() -> anyhow::Result<()> {
        use tracing_log::LogTracer;

        static LOG_TRACER_INIT: OnceLock<Result<(), String>> = OnceLock::new();

        let result = LOG_TRACER_INIT.get_or_init(|| LogTracer::init().map_err(|e| e.to_string()));

        result
            .as_ref()
            .map_err(|e| anyhow::anyhow!("LogTracer初始化失败: {}", e))?;
        Ok(())
    }

    /// 构造环境过滤器，`RUST_LOG` 优先
    fn build_env_filter(config: &LogConfig) -> EnvFilter {
        let mut directives = vec![Self::level_to_string(config.level).to_string()];
        directives.extend(
            config
                .module_levels
                .iter()
                .map(|(module, level)| format!("{}={}", module, Self::level_to_string(*level))),
        );

        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives.join(",")))
    }

    /// 初始化 tracing subscriber
    fn init_tracing_subscriber(config: &LogConfig) -> anyhow::Result<()> {
        let env_filter = Self::build_env_filter(config);

        let fmt_layer = match &config.file_path {
            Some(file_path) => {
                if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| anyhow::anyhow!("创建日志目录失败: {}", e))?;
                }
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(file_path)
                    .map_err(|e| anyhow::anyhow!("创建日志文件失败: {}", e))?;
                let writer = Arc::new(file);

                if config.json_format {
                    fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_timer(fmt::time::ChronoUtc::rfc_3339())
                        .boxed()
                } else {
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_timer(fmt::time::ChronoUtc::rfc_3339())
                        .boxed()
                }
            }
            None if config.json_format => fmt::layer()
                .json()
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_file(true)
                .with_line_number(true)
                .boxed(),
            None => fmt::layer()
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_target(true)
                .boxed(),
        };

        match registry().with(env_filter).with(fmt_layer).try_init() {
            Ok(()) => {
                tracing::debug!("日志配置: {:?}", config);
                Ok(())
            }
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains("already been set")
                    || error_msg.contains("already initialized")
                {
                    // 测试中其他用例可能已经设置过全局订阅者
                    Ok(())
                } else {
                    Err(anyhow::anyhow!(
                        "tracing subscriber初始化失败: {}",
                        error_msg
                    ))
                }
            }
        }
    }

    /// 将 log::LevelFilter 转换为字符串
    fn level_to_string(level: LevelFilter) -> &'static str {
        match level {
            LevelFilter::Off => "off",
            LevelFilter::Error => "error",
            LevelFilter::Warn => "warn",
            LevelFilter::Info => "info",
            LevelFilter::Debug => "debug",
            LevelFilter::Trace => "trace",
        }
    }

    /// 检查日志系统是否已初始化
    pub fn is_initialized() -> bool {
        GLOBAL_LOGGING_STATE
            .get()
            .map(|state| {
                state
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .initialized
            })
            .unwrap_or(false)
    }

    /// 获取当前日志配置（如果已初始化）
    pub fn current_config() -> Option<LogConfig> {
        GLOBAL_LOGGING_STATE.get().and_then(|state| {
            state
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .current_config
                .clone()
        })
    }
}
