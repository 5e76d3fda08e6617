use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 状态/类型为空时的统计标签 ("未指定")
pub const UNSPECIFIED_LABEL: &str = "غير محدد";

/// 导出统计 (派生值, 不持久化)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_value: f64,
    #[serde(rename = "totalVAT")]
    pub total_vat: f64,
    pub average_value: f64,
    /// 标签 -> 次数, 按首次出现顺序
    pub status_counts: IndexMap<String, usize>,
    pub type_counts: IndexMap<String, usize>,
}
