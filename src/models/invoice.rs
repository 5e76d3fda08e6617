use serde::{Deserialize, Deserializer, Serialize};

/// 发票记录 (门户列表页的一行)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub document_version: Option<String>,
    /// 含千分位的金额文本, 如 "1,234.50"
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub supplier_tax_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub receiver_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub receiver_tax_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub invoice_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub vat_amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub page_number: Option<String>,
    /// 明细查询键, 单次导出内唯一
    #[serde(deserialize_with = "required_text")]
    pub uuid: String,
    /// 明细行, 仅在明细补全阶段后存在
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<LineItem>>,
}

impl InvoiceRecord {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            document_id: None,
            internal_id: None,
            issue_date: None,
            document_type: None,
            document_version: None,
            total_amount: None,
            supplier_name: None,
            supplier_tax_id: None,
            receiver_name: None,
            receiver_tax_id: None,
            submission_id: None,
            status: None,
            invoice_type: None,
            vat_amount: None,
            page_number: None,
            uuid: uuid.into(),
            details: None,
        }
    }

    /// 是否带有非空明细
    pub fn has_details(&self) -> bool {
        self.details.as_ref().is_some_and(|d| !d.is_empty())
    }
}

/// 发票明细行
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub unit_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub tax: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,
}

/// 缺失字段显示为空串
pub fn text(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("")
}

/// 门户数据里数字和字符串混用, 统一按文本保存
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid uuid: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_missing_fields_deserialize_as_text() {
        let record: InvoiceRecord = serde_json::from_value(serde_json::json!({
            "uuid": "U1",
            "totalAmount": 1500.5,
            "pageNumber": 3,
            "status": null,
            "type": "I"
        }))
        .unwrap();

        assert_eq!(record.uuid, "U1");
        assert_eq!(record.total_amount.as_deref(), Some("1500.5"));
        assert_eq!(record.page_number.as_deref(), Some("3"));
        assert_eq!(record.status, None);
        assert_eq!(record.invoice_type.as_deref(), Some("I"));
        assert_eq!(text(&record.supplier_name), "");
        assert!(record.details.is_none());
    }

    #[test]
    fn missing_uuid_is_rejected() {
        let result = serde_json::from_value::<InvoiceRecord>(serde_json::json!({ "documentId": "D1" }));
        assert!(result.is_err());
    }

    #[test]
    fn serializes_with_portal_field_names() {
        let mut record = InvoiceRecord::new("U9");
        record.invoice_type = Some("C".to_string());
        record.vat_amount = Some("14".to_string());
        record.details = Some(vec![LineItem {
            unit_code: Some("EA".to_string()),
            ..Default::default()
        }]);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "C");
        assert_eq!(json["vatAmount"], "14");
        assert_eq!(json["details"][0]["unitCode"], "EA");
        assert!(json.get("documentId").is_none());
    }

    #[test]
    fn has_details_ignores_empty_lists() {
        let mut record = InvoiceRecord::new("U1");
        assert!(!record.has_details());
        record.details = Some(Vec::new());
        assert!(!record.has_details());
        record.details = Some(vec![LineItem::default()]);
        assert!(record.has_details());
    }
}
