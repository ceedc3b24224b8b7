//! HTTP健康探测器实现
//!
//! 对单个URL发起一次GET请求，并把结果归类为站点状态码

use crate::error::{ProbeError, Result};
use crate::health::status::SiteStatus;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 默认请求超时时间
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// 探测器trait，定义探测接口
#[async_trait]
pub trait Prober: Send + Sync {
    /// 对URL执行一次探测
    ///
    /// 传输层失败返回 [`SiteStatus::CONNECTION_ERROR`]，否则返回HTTP状态码。
    async fn probe(&self, url: &str) -> SiteStatus;
}

/// HTTP探测器实现
pub struct HttpProber {
    /// HTTP客户端
    client: Client,
    /// 请求超时时间
    timeout: Duration,
}

impl HttpProber {
    /// 创建新的HTTP探测器
    ///
    /// # 参数
    /// * `timeout` - 单次请求超时时间
    ///
    /// # 返回
    /// * `Result<Self>` - 探测器实例
    pub fn new(timeout: Duration) -> Result<Self> {
        // 与证书检查一致，不校验信任链
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()
            .map_err(ProbeError::RequestError)?;

        Ok(Self { client, timeout })
    }

    /// 请求超时时间
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 格式化请求错误信息，使其更加清晰易读
    fn format_request_error(error: &reqwest::Error) -> String {
        if error.is_timeout() {
            "Request timeout".to_string()
        } else if error.is_connect() {
            "Connection refused".to_string()
        } else if error.is_builder() {
            "Invalid request".to_string()
        } else {
            let error_str = error.to_string();
            if error_str.contains("dns") || error_str.contains("DNS") {
                "DNS resolution failed".to_string()
            } else if error_str.contains("certificate")
                || error_str.contains("tls")
                || error_str.contains("ssl")
            {
                "SSL/TLS handshake error".to_string()
            } else {
                format!("Request failed: {}", error_str)
            }
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> SiteStatus {
        let start_time = Instant::now();
        debug!("开始探测站点: {}", url);

        match self.client.get(url).send().await {
            Ok(response) => {
                let status = SiteStatus::from(response.status());
                info!(
                    "Status of {}: {} ({}ms)",
                    url,
                    status.describe(),
                    start_time.elapsed().as_millis()
                );
                status
            }
            Err(e) => {
                warn!(
                    "Status of {}: 1 - Connection error: {} ({})",
                    url,
                    Self::format_request_error(&e),
                    e
                );
                SiteStatus::CONNECTION_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_prober_creation() {
        let prober = HttpProber::new(Duration::from_secs(10));
        assert!(prober.is_ok());
        assert_eq!(prober.unwrap().timeout(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_probe_returns_200() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(200)
            .create_async()
            .await;

        let prober = HttpProber::new(Duration::from_secs(5)).unwrap();
        let status = prober.probe(&format!("{}/health", server.url())).await;

        assert_eq!(status, SiteStatus::OK);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_probe_returns_literal_error_code() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let prober = HttpProber::new(Duration::from_secs(5)).unwrap();
        let status = prober.probe(&format!("{}/missing", server.url())).await;

        assert_eq!(status.code(), 404);
        assert!(!status.is_healthy());
    }

    #[tokio::test]
    async fn test_redirects_are_followed() {
        let mut server = mockito::Server::new_async().await;
        let target = format!("{}/new", server.url());
        server
            .mock("GET", "/old")
            .with_status(301)
            .with_header("location", &target)
            .create_async()
            .await;
        server
            .mock("GET", "/new")
            .with_status(200)
            .create_async()
            .await;

        let prober = HttpProber::new(Duration::from_secs(5)).unwrap();
        let status = prober.probe(&format!("{}/old", server.url())).await;

        assert_eq!(status, SiteStatus::OK);
    }

    #[tokio::test]
    async fn test_connection_refused_is_status_1() {
        let prober = HttpProber::new(Duration::from_secs(2)).unwrap();
        let status = prober.probe("http://127.0.0.1:1/").await;
        assert_eq!(status, SiteStatus::CONNECTION_ERROR);
    }

    #[tokio::test]
    async fn test_invalid_url_is_status_1() {
        let prober = HttpProber::new(Duration::from_secs(2)).unwrap();
        let status = prober.probe("not a url").await;
        assert_eq!(status, SiteStatus::CONNECTION_ERROR);
    }
}
