//! 诊断路由处理函数

use super::DiagnosticsState;
use crate::health::CycleReport;
use crate::registry::{RegistrySummary, SiteMap};
use axum::{extract::State, response::Json};
use chrono::Utc;
use serde::Serialize;

/// 运行状态响应
#[derive(Debug, Serialize)]
pub struct DebugStatus {
    /// 应用名称
    pub name: &'static str,
    /// 版本
    pub version: &'static str,
    /// 运行时长（秒）
    pub uptime_seconds: i64,
    /// 注册表统计
    pub sites: RegistrySummary,
    /// 最近一轮检测报告
    pub last_cycle: Option<CycleReport>,
}

/// 存活检查
pub async fn healthz() -> &'static str {
    "ok"
}

/// 当前站点列表
pub async fn sites(State(state): State<DiagnosticsState>) -> Json<SiteMap> {
    Json(state.registry.list().await)
}

/// 运行状态
pub async fn debug_status(State(state): State<DiagnosticsState>) -> Json<DebugStatus> {
    let last_cycle = state.last_report.read().await.clone();

    Json(DebugStatus {
        name: crate::APP_NAME,
        version: crate::VERSION,
        uptime_seconds: (Utc::now() - state.start_time).num_seconds(),
        sites: state.registry.summary().await,
        last_cycle,
    })
}
