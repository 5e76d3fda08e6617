use super::{DetailResponse, PageResponse, PageSource};
use crate::error::SourceError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 目录型数据源, 读取页面脚本导出的 JSON 快照
///
/// 目录结构:
/// - `current.json`          当前可见页 (缺省时取第 1 页)
/// - `pages/page-<n>.json`   第 n 页
/// - `details/<uuid>.json`   单张发票明细
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
    host: String,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>, host: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            host: host.into(),
        }
    }

    fn page_path(&self, page: u32) -> PathBuf {
        self.dir.join("pages").join(format!("page-{}.json", page))
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
        tracing::debug!("读取数据文件 {}", path.display());
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => SourceError::NotFound(path.display().to_string()),
            _ => SourceError::Io(e),
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl PageSource for JsonDirSource {
    fn host(&self) -> &str {
        &self.host
    }

    async fn fetch_current_page(&self) -> Result<PageResponse, SourceError> {
        let current = self.dir.join("current.json");
        if tokio::fs::try_exists(&current).await? {
            Self::read_json(&current).await
        } else {
            Self::read_json(&self.page_path(1)).await
        }
    }

    async fn fetch_page(&self, page: u32) -> Result<PageResponse, SourceError> {
        Self::read_json(&self.page_path(page)).await
    }

    async fn fetch_details(&self, uuid: &str) -> Result<DetailResponse, SourceError> {
        // uuid 直接拼进路径, 拒绝路径分隔符
        if uuid.is_empty() || uuid.contains(['/', '\\']) || uuid.contains("..") {
            return Err(SourceError::NotFound(format!("invalid uuid {:?}", uuid)));
        }
        Self::read_json(&self.dir.join("details").join(format!("{}.json", uuid))).await
    }
}
