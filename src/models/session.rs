use crate::models::{ExportFormat, ExportOptions, ExportScope, InvoiceRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// 当前页快照 (流水线外加载一次)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub records: Vec<InvoiceRecord>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
}

/// 组装所需的显示元数据, 不属于记录数据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportContext {
    pub current_page: u32,
    pub total_pages: u32,
    pub exported_at: DateTime<Utc>,
}

/// 单次导出的会话, 在各阶段之间显式传递
#[derive(Debug, Clone)]
pub struct ExportSession {
    pub format: ExportFormat,
    pub options: ExportOptions,
    pub context: ExportContext,
    pub records: Vec<InvoiceRecord>,
}

impl ExportSession {
    pub fn scope(&self) -> ExportScope {
        self.options.scope()
    }
}
