pub mod json_dir;
pub mod memory;

pub use json_dir::JsonDirSource;
pub use memory::MemorySource;

use crate::error::SourceError;
use crate::models::{InvoiceRecord, LineItem, PageSnapshot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 页面数据源 (门户页面的外部协作方)
#[async_trait]
pub trait PageSource: Send + Sync {
    /// 数据源所在主机, 用于判断是否受支持
    fn host(&self) -> &str;

    /// 当前可见页
    async fn fetch_current_page(&self) -> Result<PageResponse, SourceError>;

    /// 指定页 (从 1 开始)
    async fn fetch_page(&self, page: u32) -> Result<PageResponse, SourceError>;

    /// 单张发票的明细
    async fn fetch_details(&self, uuid: &str) -> Result<DetailResponse, SourceError>;
}

fn default_true() -> bool {
    true
}

/// 单页响应
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub success: bool,
    #[serde(default)]
    pub rows: Vec<InvoiceRecord>,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(default = "default_true")]
    pub has_next: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageResponse {
    pub fn ok(rows: Vec<InvoiceRecord>, current_page: u32, total_pages: u32) -> Self {
        Self {
            success: true,
            rows,
            current_page,
            total_pages,
            total_count: None,
            has_next: current_page < total_pages,
            error: None,
        }
    }

    /// `success: false` 视同调用失败
    pub fn into_result(self) -> Result<Self, SourceError> {
        if self.success {
            Ok(self)
        } else {
            Err(SourceError::Unsuccessful(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }

    pub fn into_snapshot(self) -> PageSnapshot {
        let total_count = self.total_count.unwrap_or(self.rows.len() as u64);
        let current_page = self.current_page.max(1);
        PageSnapshot {
            current_page,
            total_pages: self.total_pages.max(current_page),
            total_count,
            records: self.rows,
        }
    }
}

/// 明细响应
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailResponse {
    pub success: bool,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetailResponse {
    pub fn ok(line_items: Vec<LineItem>) -> Self {
        Self {
            success: true,
            line_items,
            error: None,
        }
    }

    pub fn into_result(self) -> Result<Vec<LineItem>, SourceError> {
        if self.success {
            Ok(self.line_items)
        } else {
            Err(SourceError::Unsuccessful(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}
