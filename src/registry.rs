//! 站点注册表
//!
//! URL到当前状态的共享映射。监控循环、命令接口和诊断服务持有同一个句柄，
//! 所有读写都经过同一把锁。

use crate::health::SiteStatus;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// URL到状态的映射
pub type SiteMap = BTreeMap<String, SiteStatus>;

/// 注册表统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySummary {
    /// 站点总数
    pub total: usize,
    /// 健康站点数
    pub healthy: usize,
    /// 尚未探测的站点数
    pub never_checked: usize,
    /// 不健康站点数（含未探测）
    pub unhealthy: usize,
}

/// 站点注册表
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: Arc<RwLock<SiteMap>>,
}

impl SiteRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 从快照创建注册表
    pub fn from_snapshot(snapshot: SiteMap) -> Self {
        Self {
            sites: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// 添加站点，已存在时重置为未探测
    pub async fn add(&self, url: &str) {
        let mut sites = self.sites.write().await;
        sites.insert(url.to_string(), SiteStatus::NEVER_CHECKED);
    }

    /// 移除站点，不存在时无操作
    ///
    /// 返回站点此前是否存在
    pub async fn remove(&self, url: &str) -> bool {
        let mut sites = self.sites.write().await;
        sites.remove(url).is_some()
    }

    /// 当前映射的副本
    pub async fn list(&self) -> SiteMap {
        self.sites.read().await.clone()
    }

    /// 当前所有URL，作为一次循环的迭代快照
    pub async fn urls(&self) -> Vec<String> {
        self.sites.read().await.keys().cloned().collect()
    }

    /// 查询单个站点状态
    pub async fn get(&self, url: &str) -> Option<SiteStatus> {
        self.sites.read().await.get(url).copied()
    }

    /// 覆盖已存在站点的状态
    ///
    /// 站点在探测期间被移除时不会重新创建，返回false
    pub async fn set_status(&self, url: &str, status: SiteStatus) -> bool {
        let mut sites = self.sites.write().await;
        match sites.get_mut(url) {
            Some(current) => {
                *current = status;
                true
            }
            None => false,
        }
    }

    /// 所有状态不为200的站点
    pub async fn unhealthy(&self) -> Vec<(String, SiteStatus)> {
        self.sites
            .read()
            .await
            .iter()
            .filter(|(_, status)| !status.is_healthy())
            .map(|(url, status)| (url.clone(), *status))
            .collect()
    }

    /// 站点数量
    pub async fn len(&self) -> usize {
        self.sites.read().await.len()
    }

    /// 是否为空
    pub async fn is_empty(&self) -> bool {
        self.sites.read().await.is_empty()
    }

    /// 统计信息
    pub async fn summary(&self) -> RegistrySummary {
        let sites = self.sites.read().await;
        let healthy = sites.values().filter(|s| s.is_healthy()).count();
        let never_checked = sites
            .values()
            .filter(|s| **s == SiteStatus::NEVER_CHECKED)
            .count();

        RegistrySummary {
            total: sites.len(),
            healthy,
            never_checked,
            unhealthy: sites.len() - healthy,
        }
    }
}
