pub mod csv_workbook;
pub mod json_file;

pub use csv_workbook::CsvWorkbookSink;
pub use json_file::JsonFileSink;

use crate::error::SinkError;
use crate::models::{StructuredDocument, TabularDocument};
use async_trait::async_trait;
use std::path::PathBuf;

/// 表格文档输出端
#[async_trait]
pub trait TabularSink: Send + Sync {
    /// 写出文档, 返回产物路径
    async fn write(&self, document: &TabularDocument) -> Result<PathBuf, SinkError>;
}

/// 结构化文档输出端
#[async_trait]
pub trait StructuredSink: Send + Sync {
    async fn write(&self, document: &StructuredDocument) -> Result<PathBuf, SinkError>;
}
