use serde::{Deserialize, Serialize};

/// 分页抓取进度事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestProgress {
    pub current_page: u32,
    pub total_pages: u32,
    pub message: String,
}

impl HarvestProgress {
    pub fn new(current_page: u32, total_pages: u32, message: impl Into<String>) -> Self {
        Self {
            current_page,
            total_pages,
            message: message.into(),
        }
    }

    /// 完成百分比, 上限 100
    pub fn percentage(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        (self.current_page as f64 / self.total_pages as f64 * 100.0).min(100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Loading,
    Success,
    Error,
    None,
}

/// 状态栏消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub message: String,
}

impl StatusMessage {
    pub fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// success / error 消息会自动清除
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, StatusKind::Success | StatusKind::Error)
    }
}

/// 流向状态面板的事件
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    Progress(HarvestProgress),
    Status(StatusMessage),
}
