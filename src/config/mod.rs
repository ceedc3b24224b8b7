//! 配置管理模块
//!
//! 提供设置文件解析、环境变量替换和配置验证功能

pub mod loader;
pub mod types;

// 重新导出主要类型
pub use loader::{resolve_settings_path, ConfigLoader, TomlConfigLoader};
pub use types::{validate_config, Config};
