//! 监控循环模块
//!
//! 每轮：导出快照 → 逐个探测站点（https站点附加证书检查）→ 写回注册表 → 发送告警，
//! 然后等待固定间隔，直到收到停止信号。

use crate::health::cert::{CertificateChecker, DEFAULT_TLS_PORT};
use crate::health::checker::Prober;
use crate::health::status::SiteStatus;
use crate::notification::Notifier;
use crate::registry::SiteRegistry;
use crate::store::SnapshotStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use url::{Host, Url};

/// 默认检测间隔
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(300);

/// 默认证书告警阈值（天）
pub const DEFAULT_CERT_ALERT_DAYS: i64 = 10;

/// 监控循环设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// 两轮之间的等待时间
    pub interval: Duration,
    /// 证书告警阈值（天）
    pub cert_alert_days: i64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_CHECK_INTERVAL,
            cert_alert_days: DEFAULT_CERT_ALERT_DAYS,
        }
    }
}

/// 单轮检测报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// 开始时间
    pub started_at: DateTime<Utc>,
    /// 结束时间
    pub finished_at: DateTime<Utc>,
    /// 本轮探测的站点数
    pub probed: usize,
    /// 本轮结束时不健康的站点数
    pub unhealthy: usize,
    /// 成功发送的告警数
    pub notified: usize,
    /// 快照是否保存成功
    pub snapshot_saved: bool,
}

/// https站点的证书检查目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsTarget {
    /// 主机名或IP
    pub host: String,
    /// 端口
    pub port: u16,
}

impl TlsTarget {
    /// 从URL提取证书检查目标，非https站点返回None
    pub fn from_url(site: &str) -> Option<Self> {
        let parsed = match Url::parse(site) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("无法解析URL {}: {}", site, e);
                return None;
            }
        };

        if parsed.scheme() != "https" {
            return None;
        }

        let host = match parsed.host()? {
            Host::Domain(domain) => domain.to_string(),
            Host::Ipv4(addr) => addr.to_string(),
            Host::Ipv6(addr) => addr.to_string(),
        };

        Some(Self {
            host,
            port: parsed.port().unwrap_or(DEFAULT_TLS_PORT),
        })
    }
}

/// 检测单个站点
///
/// 先取HTTP状态码；https站点在传输成功时再检查证书，证书即将过期时覆盖为2。
pub async fn evaluate_site(
    prober: &dyn Prober,
    cert_checker: &dyn CertificateChecker,
    site: &str,
    cert_alert_days: i64,
) -> SiteStatus {
    let status = prober.probe(site).await;
    if status == SiteStatus::CONNECTION_ERROR {
        return status;
    }

    let Some(target) = TlsTarget::from_url(site) else {
        return status;
    };

    match cert_checker
        .expiring_soon(&target.host, target.port, cert_alert_days)
        .await
    {
        Ok(true) => {
            info!("Status of {}: 2 - certificate is expiring", site);
            SiteStatus::CERT_EXPIRING
        }
        Ok(false) => status,
        Err(e) => {
            warn!("Error in SSL dial to {}:{}: {}", target.host, target.port, e);
            status
        }
    }
}

/// 监控循环
pub struct MonitorLoop {
    /// 站点注册表
    registry: SiteRegistry,
    /// HTTP探测器
    prober: Arc<dyn Prober>,
    /// 证书检查器
    cert_checker: Arc<dyn CertificateChecker>,
    /// 告警通知器
    notifier: Arc<Notifier>,
    /// 快照存储
    store: Arc<dyn SnapshotStore>,
    /// 设置
    settings: MonitorSettings,
    /// 最近一轮的报告
    last_report: Arc<RwLock<Option<CycleReport>>>,
}

impl MonitorLoop {
    /// 创建新的监控循环
    pub fn new(
        registry: SiteRegistry,
        prober: Arc<dyn Prober>,
        cert_checker: Arc<dyn CertificateChecker>,
        notifier: Arc<Notifier>,
        store: Arc<dyn SnapshotStore>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            registry,
            prober,
            cert_checker,
            notifier,
            store,
            settings,
            last_report: Arc::new(RwLock::new(None)),
        }
    }

    /// 最近一轮报告的共享句柄，供诊断接口读取
    pub fn report_handle(&self) -> Arc<RwLock<Option<CycleReport>>> {
        Arc::clone(&self.last_report)
    }

    /// 检测单个站点，返回本轮的最终状态
    pub async fn check_site(&self, site: &str) -> SiteStatus {
        evaluate_site(
            self.prober.as_ref(),
            self.cert_checker.as_ref(),
            site,
            self.settings.cert_alert_days,
        )
        .await
    }

    /// 导出快照，失败只记录日志
    async fn persist_snapshot(&self) -> bool {
        let sites = self.registry.list().await;
        let store = Arc::clone(&self.store);

        match tokio::task::spawn_blocking(move || store.save(&sites)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("保存快照失败: {}", e);
                false
            }
            Err(e) => {
                warn!("保存快照任务异常: {}", e);
                false
            }
        }
    }

    /// 执行一轮检测
    pub async fn run_cycle(&self) -> CycleReport {
        let started_at = Utc::now();
        let snapshot_saved = self.persist_snapshot().await;

        // 迭代快照：本轮期间新增或删除的站点不一定被访问
        let sites = self.registry.urls().await;
        debug!("开始新一轮检测，站点数量: {}", sites.len());

        for site in &sites {
            let status = self.check_site(site).await;
            if !self.registry.set_status(site, status).await {
                debug!("站点在检测期间被移除: {}", site);
            }
        }

        let notified = self.notifier.notify(&self.registry).await;
        let unhealthy = self.registry.summary().await.unhealthy;

        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            probed: sites.len(),
            unhealthy,
            notified,
            snapshot_saved,
        };

        info!(
            "本轮检测完成: 站点 {}, 异常 {}, 告警 {}",
            report.probed, report.unhealthy, report.notified
        );

        *self.last_report.write().await = Some(report.clone());
        report
    }

    /// 持续运行，直到收到停止信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            "启动监控循环，检测间隔: {}s，证书告警阈值: {}天",
            self.settings.interval.as_secs(),
            self.settings.cert_alert_days
        );

        loop {
            tokio::select! {
                _ = self.run_cycle() => {}
                _ = shutdown_rx.recv() => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.interval) => {}
                _ = shutdown_rx.recv() => break,
            }
        }

        info!("监控循环已停止");
    }
}
