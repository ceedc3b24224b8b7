//! 健康检测模块
//!
//! 提供站点状态模型、HTTP探测、证书过期检查和监控循环

pub mod cert;
pub mod checker;
pub mod monitor;
pub mod status;

// 重新导出主要类型
pub use cert::{CertScope, CertificateChecker, TlsCertificateChecker};
pub use checker::{HttpProber, Prober};
pub use monitor::{evaluate_site, CycleReport, MonitorLoop, MonitorSettings};
pub use status::SiteStatus;
