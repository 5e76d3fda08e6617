use crate::error::ExportError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 导出选项 (界面勾选项的封闭集合)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    pub date: bool,
    pub id: bool,
    pub seller_id: bool,
    pub seller_name: bool,
    pub buyer_id: bool,
    pub buyer_name: bool,
    pub uuid: bool,
    #[serde(rename = "type")]
    pub invoice_type: bool,
    pub separate_seller: bool,
    pub separate_buyer: bool,
    pub combine_all: bool,
    /// 逐张补全明细
    pub download_details: bool,
    /// 抓取全部分页而非当前页
    pub download_all: bool,
}

impl ExportOptions {
    /// 至少选择 date / id / uuid 之一
    pub fn has_identifying_field(&self) -> bool {
        self.date || self.id || self.uuid
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if self.has_identifying_field() {
            Ok(())
        } else {
            Err(ExportError::Validation)
        }
    }

    pub fn scope(&self) -> ExportScope {
        if self.download_all {
            ExportScope::AllPages
        } else {
            ExportScope::CurrentPage
        }
    }
}

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// 多工作表表格文档
    Excel,
    /// 结构化数据文档
    Json,
    /// 尚未实现
    Pdf,
}

impl ExportFormat {
    pub fn ensure_supported(self) -> Result<(), ExportError> {
        match self {
            ExportFormat::Excel | ExportFormat::Json => Ok(()),
            ExportFormat::Pdf => Err(ExportError::UnsupportedFormat(self)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Excel => write!(f, "Excel"),
            ExportFormat::Json => write!(f, "JSON"),
            ExportFormat::Pdf => write!(f, "PDF"),
        }
    }
}

/// 导出范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportScope {
    CurrentPage,
    AllPages,
}
