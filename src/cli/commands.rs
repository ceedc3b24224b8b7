//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::config::Config;
use crate::error::Result;
use crate::health::{evaluate_site, HttpProber, SiteStatus, TlsCertificateChecker};
use crate::store::{JsonFileStore, SnapshotStore};
use async_trait::async_trait;
use serde::Serialize;

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, config: &Config) -> Result<()>;
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, _config: &Config) -> Result<()> {
        println!("{} v{}", crate::APP_NAME, crate::VERSION);
        println!("{}", crate::APP_DESCRIPTION);
        Ok(())
    }
}

/// 单次检测结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    /// 站点URL
    pub url: String,
    /// 最终状态
    pub status: SiteStatus,
    /// 状态描述
    pub description: String,
}

impl CheckOutcome {
    /// 构造检测结果
    pub fn new(url: &str, status: SiteStatus) -> Self {
        Self {
            url: url.to_string(),
            status,
            description: status.describe(),
        }
    }

    /// 单行文本输出
    pub fn render(&self) -> String {
        let icon = if self.status.is_healthy() { "✓" } else { "✗" };
        format!(
            "{} {} - {} ({})",
            icon, self.url, self.status, self.description
        )
    }
}

/// 检测命令
pub struct CheckCommand {
    /// 站点URL
    pub url: String,
}

impl CheckCommand {
    /// 执行一次探测和证书检查，不修改注册表和快照
    pub async fn check(&self, config: &Config) -> Result<CheckOutcome> {
        let prober = HttpProber::new(config.request_timeout())?;
        let cert_checker = TlsCertificateChecker::new(config.request_timeout(), config.cert_scope)?;

        let status = evaluate_site(&prober, &cert_checker, &self.url, config.cert_alert_days).await;
        Ok(CheckOutcome::new(&self.url, status))
    }
}

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, config: &Config) -> Result<()> {
        let outcome = self.check(config).await?;
        println!("{}", outcome.render());
        Ok(())
    }
}

/// 站点列表命令
pub struct SitesCommand;

impl SitesCommand {
    /// 格式化快照文件内容
    pub fn render(config: &Config) -> Result<String> {
        let store = JsonFileStore::new(&config.snapshot_path);
        let sites = store.load()?;
        Ok(serde_json::to_string_pretty(&sites)?)
    }
}

#[async_trait]
impl Command for SitesCommand {
    async fn execute(&self, config: &Config) -> Result<()> {
        println!("{}", Self::render(config)?);
        Ok(())
    }
}
