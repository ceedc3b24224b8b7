//! 快照存储
//!
//! 注册表的持久化导出，格式为扁平的 `{"url": status}` JSON 文档

use crate::error::StoreError;
use crate::registry::SiteMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 默认快照文件
pub const DEFAULT_SNAPSHOT_PATH: &str = "config.json";

/// 快照存储trait
pub trait SnapshotStore: Send + Sync {
    /// 保存快照
    fn save(&self, sites: &SiteMap) -> Result<(), StoreError>;

    /// 读取快照
    fn load(&self) -> Result<SiteMap, StoreError>;

    /// 读取快照，文件缺失或损坏时记录日志并返回空映射
    fn load_or_empty(&self) -> SiteMap {
        match self.load() {
            Ok(sites) => {
                info!("已加载 {} 个站点", sites.len());
                sites
            }
            Err(e) => {
                warn!("无法读取快照，以空列表启动: {}", e);
                SiteMap::new()
            }
        }
    }
}

/// JSON文件快照存储
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    /// 快照文件路径
    path: PathBuf,
}

impl JsonFileStore {
    /// 创建新的文件存储
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 快照文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// 临时文件路径，写完后重命名为正式文件
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, sites: &SiteMap) -> Result<(), StoreError> {
        let data = serde_json::to_vec(sites)?;

        // 确保目录存在
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let temp_path = self.temp_path();
        fs::write(&temp_path, data).map_err(|e| self.io_error(e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(e))?;

        debug!("快照已保存: {} ({} 个站点)", self.path.display(), sites.len());
        Ok(())
    }

    fn load(&self) -> Result<SiteMap, StoreError> {
        let data = fs::read(&self.path).map_err(|e| self.io_error(e))?;
        serde_json::from_slice(&data).map_err(|source| StoreError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::SiteStatus;
    use tempfile::TempDir;

    fn sample_sites() -> SiteMap {
        let mut sites = SiteMap::new();
        sites.insert("https://example.com".to_string(), SiteStatus::OK);
        sites.insert("http://down.example".to_string(), SiteStatus::CONNECTION_ERROR);
        sites.insert("https://new.example/".to_string(), SiteStatus::NEVER_CHECKED);
        sites
    }

    #[test]
    fn test_save_then_load_reproduces_mapping() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("config.json"));

        store.save(&sample_sites()).unwrap();
        assert_eq!(store.load().unwrap(), sample_sites());
    }

    #[test]
    fn test_file_is_flat_key_value_document() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("config.json"));
        store.save(&sample_sites()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["https://example.com"], 200);
        assert_eq!(raw["http://down.example"], 1);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));

        assert!(matches!(store.load(), Err(StoreError::Io { .. })));
        assert!(store.load_or_empty().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        let store = JsonFileStore::new(&path);

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
        assert!(store.load_or_empty().is_empty());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/state/config.json"));

        store.save(&sample_sites()).unwrap();
        assert!(store.path().exists());
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_reads_snapshot_written_by_hand() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"https://a.example":0,"https://b.example":404}"#).unwrap();

        let sites = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(sites["https://b.example"].code(), 404);
        assert_eq!(sites["https://a.example"], SiteStatus::NEVER_CHECKED);
    }

    #[test]
    fn test_out_of_range_codes_keep_whole_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"https://a.example":-1,"https://b.example":70000,"https://c.example":200}"#,
        )
        .unwrap();

        let sites = JsonFileStore::new(&path).load_or_empty();
        assert_eq!(sites.len(), 3);
        assert_eq!(sites["https://a.example"].code(), -1);
        assert_eq!(sites["https://b.example"].code(), 70000);
        assert_eq!(sites["https://c.example"], SiteStatus::OK);
    }
}
