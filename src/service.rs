//! 服务管理模块
//!
//! 负责配置加载、组件初始化和生命周期管理

use crate::bot::{CommandHandler, UpdatePoller};
use crate::cli::args::Args;
use crate::config::{resolve_settings_path, Config, ConfigLoader, TomlConfigLoader};
use crate::health::{HttpProber, MonitorLoop, TlsCertificateChecker};
use crate::notification::{
    AlertTemplate, NotificationSender, Notifier, TelegramClient, TelegramSender,
};
use crate::registry::{SiteMap, SiteRegistry};
use crate::store::{JsonFileStore, SnapshotStore};
use crate::web::{parse_listen_addr, DiagnosticsServer, DiagnosticsState};
use anyhow::{anyhow, Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// 启动通知前缀
pub const STARTUP_MESSAGE_PREFIX: &str = "I'm alive; here are the sites I will monitor: ";

/// 生成启动通知
pub fn startup_message(sites: &SiteMap) -> String {
    let list = serde_json::to_string(sites).unwrap_or_else(|_| "{}".to_string());
    format!("{}{}", STARTUP_MESSAGE_PREFIX, list)
}

/// 服务组件结构
pub struct ServiceComponents {
    /// 站点注册表
    pub registry: SiteRegistry,
    /// 快照存储
    pub store: Arc<JsonFileStore>,
    /// Telegram客户端
    pub client: Arc<TelegramClient>,
    /// 发往配置会话的发送器
    pub sender: Arc<dyn NotificationSender>,
    /// 监控循环
    pub monitor: Arc<MonitorLoop>,
    /// 诊断接口地址
    pub diag_addr: SocketAddr,
}

/// 合并后的配置及其来源
///
/// 配置在日志系统初始化之前加载，来源由调用方在日志就绪后输出。
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// 合并命令行参数后的配置
    pub config: Config,
    /// 实际读取的设置文件，未找到时为None
    pub settings_path: Option<PathBuf>,
}

impl LoadedConfig {
    /// 记录配置来源
    pub fn log_source(&self) {
        match &self.settings_path {
            Some(path) => info!("已加载设置文件: {}", path.display()),
            None => info!("未找到设置文件，使用默认值和命令行参数"),
        }
    }
}

/// 服务启动器
pub struct ServiceLauncher;

impl ServiceLauncher {
    /// 合并设置文件与命令行参数，不做验证
    pub async fn load_config(args: &Args) -> Result<LoadedConfig> {
        let settings_path = resolve_settings_path(args.settings.as_deref());
        let mut config = match &settings_path {
            Some(path) => TomlConfigLoader::new(true)
                .load_from_file(path)
                .await
                .with_context(|| format!("加载设置文件失败: {}", path.display()))?,
            None => Config::default(),
        };

        args.apply_overrides(&mut config);
        Ok(LoadedConfig {
            config,
            settings_path,
        })
    }

    /// 初始化服务组件
    pub fn initialize_service_components(config: &Config) -> Result<ServiceComponents> {
        info!("初始化服务组件...");

        let store = Arc::new(JsonFileStore::new(&config.snapshot_path));
        let registry = SiteRegistry::from_snapshot(store.load_or_empty());

        let client = Arc::new(
            TelegramClient::new(&config.telegram_api_url, &config.bot_token)
                .context("创建Telegram客户端失败")?,
        );
        let sender: Arc<dyn NotificationSender> =
            Arc::new(TelegramSender::new(Arc::clone(&client), config.chat_id));

        let template =
            AlertTemplate::new(&config.alert_template).context("告警模板编译失败")?;
        let notifier = Arc::new(Notifier::new(Arc::clone(&sender), template));

        let prober =
            Arc::new(HttpProber::new(config.request_timeout()).context("创建HTTP探测器失败")?);
        let cert_checker = Arc::new(
            TlsCertificateChecker::new(config.request_timeout(), config.cert_scope)
                .context("创建证书检查器失败")?,
        );

        let monitor = Arc::new(MonitorLoop::new(
            registry.clone(),
            prober,
            cert_checker,
            notifier,
            store.clone(),
            config.monitor_settings(),
        ));

        let diag_addr = parse_listen_addr(&config.diag_listen).map_err(|e| anyhow!(e))?;

        Ok(ServiceComponents {
            registry,
            store,
            client,
            sender,
            monitor,
            diag_addr,
        })
    }

    /// 运行服务，直到关闭信号发出
    pub async fn run(config: Config, shutdown_tx: broadcast::Sender<()>) -> Result<()> {
        let components = Self::initialize_service_components(&config)?;

        let me = components
            .client
            .get_me()
            .await
            .context("Telegram机器人授权失败")?;
        info!(
            "Authorized on account {}",
            me.username.as_deref().unwrap_or("unknown")
        );
        info!("Snapshot file: {}", config.snapshot_path.display());
        info!("ChatID: {}", config.chat_id);
        info!("Diagnostics interface: {}", components.diag_addr);

        let diag_state =
            DiagnosticsState::new(components.registry.clone(), components.monitor.report_handle());
        let diag_handle = tokio::spawn(
            DiagnosticsServer::new(components.diag_addr, diag_state).start(shutdown_tx.subscribe()),
        );

        info!("Starting monitoring thread");
        let monitor = Arc::clone(&components.monitor);
        let monitor_rx = shutdown_tx.subscribe();
        let monitor_handle = tokio::spawn(async move { monitor.run(monitor_rx).await });

        let announcement = startup_message(&components.registry.list().await);
        if let Err(e) = components.sender.send(&announcement).await {
            warn!("启动通知发送失败: {}", e);
        }

        let poller = UpdatePoller::new(
            Arc::clone(&components.client),
            CommandHandler::new(components.registry.clone()),
        );
        let poller_handle = tokio::spawn(poller.run(shutdown_tx.subscribe()));

        let (monitor_result, poller_result, diag_result) =
            tokio::join!(monitor_handle, poller_handle, diag_handle);
        for (name, result) in [
            ("监控循环", monitor_result),
            ("命令轮询", poller_result),
            ("诊断服务器", diag_result),
        ] {
            if let Err(e) = result {
                error!("{}任务异常退出: {}", name, e);
            }
        }

        Self::save_final_snapshot(&components).await;

        info!("服务已停止");
        Ok(())
    }

    /// 退出前保存最终快照
    async fn save_final_snapshot(components: &ServiceComponents) {
        let sites = components.registry.list().await;
        let store = Arc::clone(&components.store);

        match tokio::task::spawn_blocking(move || store.save(&sites)).await {
            Ok(Ok(())) => info!("已保存最终快照"),
            Ok(Err(e)) => warn!("保存最终快照失败: {}", e),
            Err(e) => warn!("保存最终快照任务异常: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::SiteStatus;
    use clap::Parser;
    use serial_test::serial;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> Config {
        Config {
            bot_token: "TOKEN".to_string(),
            chat_id: 42,
            snapshot_path: dir.path().join("config.json"),
            diag_listen: "127.0.0.1:0".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_startup_message_lists_sites() {
        let mut sites = SiteMap::new();
        sites.insert("https://a.example".to_string(), SiteStatus::OK);

        assert_eq!(
            startup_message(&sites),
            r#"I'm alive; here are the sites I will monitor: {"https://a.example":200}"#
        );
        assert_eq!(
            startup_message(&SiteMap::new()),
            "I'm alive; here are the sites I will monitor: {}"
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_load_config_reports_settings_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "bot_token = \"FROM_FILE\"\nchat_id = 7\n").unwrap();

        let args = Args::try_parse_from([
            "site-vitals",
            "--settings",
            path.to_str().unwrap(),
            "--chat-id",
            "-100",
        ])
        .unwrap();
        let loaded = ServiceLauncher::load_config(&args).await.unwrap();

        assert_eq!(loaded.settings_path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config.bot_token, "FROM_FILE");
        assert_eq!(loaded.config.chat_id, -100);
    }

    #[tokio::test]
    #[serial]
    async fn test_load_config_missing_settings_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let args =
            Args::try_parse_from(["site-vitals", "--settings", path.to_str().unwrap()]).unwrap();

        assert!(ServiceLauncher::load_config(&args).await.is_err());
    }

    #[tokio::test]
    async fn test_initialize_loads_snapshot() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        std::fs::write(&config.snapshot_path, r#"{"https://a.example":502}"#).unwrap();

        let components = ServiceLauncher::initialize_service_components(&config).unwrap();

        assert_eq!(
            components.registry.get("https://a.example").await,
            Some(SiteStatus::from_code(502))
        );
        assert_eq!(components.diag_addr.port(), 0);
    }

    #[tokio::test]
    async fn test_initialize_without_snapshot_starts_empty() {
        let dir = TempDir::new().unwrap();
        let components =
            ServiceLauncher::initialize_service_components(&test_config(&dir)).unwrap();
        assert!(components.registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_run_fails_when_authorization_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/botTOKEN/getMe")
            .with_status(401)
            .with_body(r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let config = Config {
            telegram_api_url: server.url(),
            ..test_config(&dir)
        };
        let (shutdown_tx, _) = broadcast::channel(1);

        let result = ServiceLauncher::run(config, shutdown_tx).await;
        assert!(result.is_err());
    }
}
