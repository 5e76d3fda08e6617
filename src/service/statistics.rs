use crate::models::{InvoiceRecord, Statistics, UNSPECIFIED_LABEL};

/// 计算导出统计 (纯函数, 无失败路径)
pub fn compute(records: &[InvoiceRecord]) -> Statistics {
    let mut stats = Statistics::default();

    for record in records {
        // 金额去掉千分位; 税额直接解析
        stats.total_value += parse_amount(record.total_amount.as_deref().unwrap_or(""));
        stats.total_vat += parse_number(record.vat_amount.as_deref().unwrap_or(""));

        *stats
            .status_counts
            .entry(label_or_unspecified(record.status.as_deref()))
            .or_insert(0) += 1;
        *stats
            .type_counts
            .entry(label_or_unspecified(record.invoice_type.as_deref()))
            .or_insert(0) += 1;
    }

    stats.average_value = if records.is_empty() {
        0.0
    } else {
        stats.total_value / records.len() as f64
    };

    stats
}

fn label_or_unspecified(label: Option<&str>) -> String {
    match label {
        Some(l) if !l.is_empty() => l.to_string(),
        _ => UNSPECIFIED_LABEL.to_string(),
    }
}

/// 解析含千分位的金额文本, 如 "1,234.50"
pub fn parse_amount(text: &str) -> f64 {
    parse_number(&text.replace(',', ""))
}

/// 宽松解析: 读取开头的 `[+-]digits[.digits][e[+-]digits]`, 无法解析时为 0
pub fn parse_number(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return 0.0;
    }

    // 指数部分 `e[+-]digits`, 无数字时不读取
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
