use crate::models::{ExportOptions, ExportScope, InvoiceRecord, Statistics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单元格
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// 写入 CSV 等纯文本格式时的表示
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Empty => String::new(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

/// 表头样式
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderStyle {
    pub bold: bool,
    pub font_rgb: &'static str,
    pub fill_rgb: &'static str,
    pub centered: bool,
    pub thin_border: bool,
}

/// 工作表: 有序行 + 列宽/表头样式元数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
    pub column_widths: Vec<u16>,
    pub header_style: Option<HeaderStyle>,
}

/// 多工作表表格文档
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularDocument {
    /// 产物名 (不含扩展名), 编码导出范围与日期
    pub name: String,
    pub sheets: Vec<Sheet>,
}

impl TabularDocument {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// 结构化数据文档 (无损)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredDocument {
    #[serde(skip)]
    pub name: String,
    pub export_date: DateTime<Utc>,
    pub total_count: usize,
    pub export_type: ExportScope,
    pub total_pages: u32,
    pub current_page: u32,
    pub options: ExportOptions,
    pub statistics: Statistics,
    pub invoices: Vec<InvoiceRecord>,
}

/// 组装结果
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Tabular(TabularDocument),
    Structured(StructuredDocument),
}

impl Document {
    pub fn name(&self) -> &str {
        match self {
            Document::Tabular(doc) => &doc.name,
            Document::Structured(doc) => &doc.name,
        }
    }
}
