use crate::models::ExportFormat;
use thiserror::Error;

/// 页面数据源错误. `success: false` 与调用失败统一为此类型
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source reported failure: {0}")]
    Unsuccessful(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// 输出端写入错误
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 导出流程错误
#[derive(Debug, Error)]
pub enum ExportError {
    /// 未选择任何标识字段
    #[error("select at least one field to export (date, id or uuid)")]
    Validation,

    /// 当前上下文不是受支持的门户页面
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// 分页抓取中途失败, 已抓取的部分全部丢弃
    #[error("failed to load all pages (page {page}): {source}")]
    Harvest {
        page: u32,
        #[source]
        source: SourceError,
    },

    #[error("{0} export is not available yet")]
    UnsupportedFormat(ExportFormat),

    #[error("failed to write export: {0}")]
    Sink(#[from] SinkError),

    /// 已有导出在进行中
    #[error("still processing, please wait")]
    Busy,

    /// 尚未加载当前页, 单页导出没有可用记录
    #[error("current page is not loaded, reload the page first")]
    PageNotLoaded,

    #[error("failed to load invoice data: {0}")]
    Load(#[source] SourceError),
}

pub type Result<T> = std::result::Result<T, ExportError>;
