//! TLS证书过期检测
//!
//! 只评估证书有效期，不校验信任链：握手使用接受任意证书的校验器，
//! 然后逐个解析对端证书的 `NotAfter`。

use crate::error::ProbeError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::{debug, info};

/// 默认TLS端口
pub const DEFAULT_TLS_PORT: u16 = 443;

/// 证书检查范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CertScope {
    /// 对端提供的整条证书链（含中间证书与根证书）
    #[default]
    Chain,
    /// 仅叶子证书
    Leaf,
}

impl std::fmt::Display for CertScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CertScope::Chain => write!(f, "chain"),
            CertScope::Leaf => write!(f, "leaf"),
        }
    }
}

/// 证书检查器trait
#[async_trait]
pub trait CertificateChecker: Send + Sync {
    /// 检查 `host:port` 的证书是否在 `threshold_days` 天内过期（或已过期）
    async fn expiring_soon(
        &self,
        host: &str,
        port: u16,
        threshold_days: i64,
    ) -> Result<bool, ProbeError>;
}

/// 距离过期已过去的整天数
///
/// 证书尚未过期时为负数。按小时取整后除以24，有意向零截断而非向下取整：
/// 剩余9.5天记为 -9 而不是 -10。
pub fn days_since_expiry(not_after: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - not_after).num_hours() / 24
}

/// 判断是否需要告警
pub fn is_expiring(days_since_expiry: i64, threshold_days: i64) -> bool {
    days_since_expiry > -threshold_days
}

/// 评估一组DER证书，任意一张在阈值内过期即返回true
pub fn chain_expiring_soon(
    certs: &[CertificateDer<'_>],
    scope: CertScope,
    threshold_days: i64,
    now: DateTime<Utc>,
) -> Result<bool, ProbeError> {
    let inspected = match scope {
        CertScope::Chain => certs,
        CertScope::Leaf => &certs[..certs.len().min(1)],
    };

    let mut expiring = false;
    for der in inspected {
        let not_after = certificate_not_after(der)?;
        let days = days_since_expiry(not_after, now);
        debug!("证书到期时间: {}, days_since_expiry: {}", not_after, days);
        if is_expiring(days, threshold_days) {
            expiring = true;
        }
    }

    Ok(expiring)
}

/// 解析证书的 `NotAfter`
pub fn certificate_not_after(der: &CertificateDer<'_>) -> Result<DateTime<Utc>, ProbeError> {
    let (_, cert) = x509_parser::parse_x509_certificate(der.as_ref())
        .map_err(|e| ProbeError::Certificate(e.to_string()))?;

    let timestamp = cert.validity().not_after.timestamp();
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .ok_or_else(|| ProbeError::Certificate(format!("无效的到期时间戳: {}", timestamp)))
}

/// 基于rustls的证书检查器
pub struct TlsCertificateChecker {
    /// TLS连接器
    connector: TlsConnector,
    /// 建立TCP连接与握手的超时时间
    connect_timeout: Duration,
    /// 检查范围
    scope: CertScope,
}

impl TlsCertificateChecker {
    /// 创建新的证书检查器
    pub fn new(connect_timeout: Duration, scope: CertScope) -> Result<Self, ProbeError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| ProbeError::Tls(e.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            connect_timeout,
            scope,
        })
    }

    /// 当前检查范围
    pub fn scope(&self) -> CertScope {
        self.scope
    }

    /// 建立TLS连接并取出对端证书链
    async fn fetch_peer_certificates(
        &self,
        host: &str,
        port: u16,
    ) -> Result<Vec<CertificateDer<'static>>, ProbeError> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| ProbeError::InvalidUrl(format!("无效的主机名: {}", host)))?;

        let tcp = timeout(self.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| ProbeError::Timeout {
                host: host.to_string(),
            })?
            .map_err(|source| ProbeError::ConnectionError {
                host: host.to_string(),
                source,
            })?;

        let mut stream = timeout(self.connect_timeout, self.connector.connect(server_name, tcp))
            .await
            .map_err(|_| ProbeError::Timeout {
                host: host.to_string(),
            })?
            .map_err(|e| ProbeError::Tls(e.to_string()))?;

        let certs = stream
            .get_ref()
            .1
            .peer_certificates()
            .map(|certs| certs.to_vec())
            .unwrap_or_default();

        // 关闭失败不影响结果，连接随stream一起释放
        if let Err(e) = stream.shutdown().await {
            debug!("关闭TLS连接失败 {}: {}", host, e);
        }

        Ok(certs)
    }
}

#[async_trait]
impl CertificateChecker for TlsCertificateChecker {
    async fn expiring_soon(
        &self,
        host: &str,
        port: u16,
        threshold_days: i64,
    ) -> Result<bool, ProbeError> {
        let certs = self.fetch_peer_certificates(host, port).await?;
        if certs.is_empty() {
            return Err(ProbeError::Certificate(format!("{} 未提供证书", host)));
        }

        let expiring = chain_expiring_soon(&certs, self.scope, threshold_days, Utc::now())?;
        if expiring {
            info!("{}:{} 的证书将在 {} 天内过期", host, port, threshold_days);
        }
        Ok(expiring)
    }
}

/// 接受任意证书链的校验器，握手签名仍按提供者算法校验
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
