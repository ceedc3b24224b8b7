//! 诊断服务器实现
//!
//! 提供HTTP服务器和路由管理

use super::{handlers, DiagnosticsState};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// 诊断服务器
pub struct DiagnosticsServer {
    /// 监听地址
    addr: SocketAddr,
    /// 共享状态
    state: DiagnosticsState,
}

impl DiagnosticsServer {
    /// 创建新的诊断服务器
    pub fn new(addr: SocketAddr, state: DiagnosticsState) -> Self {
        Self { addr, state }
    }

    /// 创建路由
    pub fn router(state: DiagnosticsState) -> Router {
        Router::new()
            .route("/healthz", get(handlers::healthz))
            .route("/sites", get(handlers::sites))
            .route("/debug/status", get(handlers::debug_status))
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
            .with_state(state)
    }

    /// 启动服务器，直到收到停止信号
    ///
    /// 绑定失败只记录日志，不影响监控
    pub async fn start(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let listener = match TcpListener::bind(self.addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("诊断服务器绑定 {} 失败: {}", self.addr, e);
                return;
            }
        };

        info!("诊断服务器已启动: http://{}", self.addr);

        let app = Self::router(self.state);
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("接收到关闭信号，正在关闭诊断服务器...");
            })
            .await;

        if let Err(e) = result {
            error!("诊断服务器异常退出: {}", e);
        }
    }
}
