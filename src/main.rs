//! Site Vitals 主程序入口
//!
//! 网站可用性与证书过期监控机器人

use anyhow::{anyhow, Context, Result};
use site_vitals::cli::{Args, CheckCommand, Command, Commands, SitesCommand, VersionCommand};
use site_vitals::config::{validate_config, Config};
use site_vitals::logging::{LogConfig, LoggingSystem};
use site_vitals::service::ServiceLauncher;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();
    let command = args.selected_command();

    let loaded = match ServiceLauncher::load_config(&args).await {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("加载配置失败: {:#}", e);
            std::process::exit(1);
        }
    };

    let _logging_system = LoggingSystem::setup_logging(LogConfig::from_config(&loaded.config))
        .context("初始化日志系统失败")?;
    loaded.log_source();
    let config = loaded.config;

    let result = match command {
        Commands::Run => run_service(config).await,
        Commands::Check { url } => CheckCommand { url }
            .execute(&config)
            .await
            .map_err(anyhow::Error::from),
        Commands::Sites => SitesCommand
            .execute(&config)
            .await
            .map_err(anyhow::Error::from),
        Commands::Version => VersionCommand
            .execute(&config)
            .await
            .map_err(anyhow::Error::from),
    };

    if let Err(e) = result {
        error!("命令执行失败: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 前台运行监控服务
async fn run_service(config: Config) -> Result<()> {
    validate_config(&config)
        .map_err(|e| anyhow!(e))
        .context("配置验证失败")?;

    info!("{} v{} 启动", site_vitals::APP_NAME, site_vitals::VERSION);

    let (shutdown_tx, _) = broadcast::channel(1);
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = signal_tx.send(());
    });

    ServiceLauncher::run(config, shutdown_tx).await
}

/// 等待 Ctrl+C 或 SIGTERM
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("监听中断信号失败: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("监听SIGTERM失败: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("收到中断信号，正在停止服务..."),
        _ = terminate => info!("收到终止信号，正在停止服务..."),
    }
}
