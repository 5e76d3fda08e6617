use crate::models::invoice::text;
use crate::models::{
    Cell, Document, ExportContext, ExportFormat, ExportOptions, ExportScope, HeaderStyle, InvoiceRecord, Sheet,
    Statistics, StructuredDocument, TabularDocument,
};
use crate::service::statistics::parse_number;
use chrono::Local;

pub const SUMMARY_SHEET: &str = "ملخص الفواتير";
pub const STATISTICS_SHEET: &str = "الإحصائيات";
const DETAIL_SHEET_PREFIX: &str = "تفاصيل_فاتورة_";

/// 工作表名长度上限 (xlsx 限制)
pub const MAX_SHEET_NAME_CHARS: usize = 31;

/// 汇总表表头, 与门户界面一致
const SUMMARY_HEADERS: [&str; 13] = [
    "رقم المستند الإلكتروني", // 电子单据号
    "الرقم الداخلي",          // 内部编号
    "تاريخ الإصدار",          // 开具日期
    "نوع المستند",            // 单据类型
    "إصدار المستند",          // 单据版本
    "إجمالي الفاتورة",        // 发票总额
    "اسم المورد",             // 供应商名称
    "الرقم الضريبي للمورد",   // 供应商税号
    "اسم العميل",             // 客户名称
    "الرقم الضريبي للعميل",   // 客户税号
    "رقم الإرسال",            // 提交编号
    "الحالة",                 // 状态
    "رقم الصفحة",             // 页码
];
const SUMMARY_WIDTHS: [u16; 13] = [25, 15, 18, 15, 15, 15, 25, 20, 25, 20, 15, 12, 10];

const DETAIL_HEADERS: [&str; 8] = [
    "إسم الصنف",            // 品名
    "كود الوحدة",           // 单位代码
    "إسم الوحدة",           // 单位名称
    "الكمية",               // 数量
    "السعر",                // 单价
    "القيمة",               // 金额
    "ضريبة القيمة المضافة", // 增值税
    "إجمالي",               // 合计
];
const DETAIL_WIDTHS: [u16; 8] = [25, 12, 20, 10, 12, 12, 15, 12];

const SUMMARY_HEADER_STYLE: HeaderStyle = HeaderStyle {
    bold: true,
    font_rgb: "FFFFFF",
    fill_rgb: "366092",
    centered: true,
    thin_border: true,
};
const DETAIL_HEADER_STYLE: HeaderStyle = HeaderStyle {
    bold: true,
    font_rgb: "FFFFFF",
    fill_rgb: "2196F3",
    centered: true,
    thin_border: false,
};

/// 组装文档. 调用方需先确认格式受支持, 不支持的格式返回 None
pub fn assemble(
    records: &[InvoiceRecord],
    format: ExportFormat,
    options: &ExportOptions,
    context: &ExportContext,
    stats: Statistics,
) -> Option<Document> {
    match format {
        ExportFormat::Excel => Some(Document::Tabular(assemble_tabular(records, options, context, &stats))),
        ExportFormat::Json => Some(Document::Structured(assemble_structured(records, options, context, stats))),
        ExportFormat::Pdf => None,
    }
}

/// 产物名: ETA_Invoices_<AllPages|Page<n>>_<date>
pub fn artifact_stem(scope: ExportScope, context: &ExportContext, date_format: &str) -> String {
    let page_info = match scope {
        ExportScope::AllPages => "AllPages".to_string(),
        ExportScope::CurrentPage => format!("Page{}", context.current_page),
    };
    format!("ETA_Invoices_{}_{}", page_info, context.exported_at.format(date_format))
}

/// 去掉工作表名中的非法字符并截断
pub fn sheet_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME_CHARS)
        .collect()
}

fn round2(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn assemble_tabular(
    records: &[InvoiceRecord],
    options: &ExportOptions,
    context: &ExportContext,
    stats: &Statistics,
) -> TabularDocument {
    let mut sheets = vec![summary_sheet(records)];

    if options.download_details {
        sheets.extend(
            records
                .iter()
                .enumerate()
                .filter(|(_, record)| record.has_details())
                .map(|(idx, record)| detail_sheet(idx + 1, record)),
        );
    }

    sheets.push(statistics_sheet(records.len(), options.scope(), context, stats));

    TabularDocument {
        name: artifact_stem(options.scope(), context, "%Y%m%d"),
        sheets,
    }
}

/// 汇总表: 列集合固定, 与字段勾选无关
fn summary_sheet(records: &[InvoiceRecord]) -> Sheet {
    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(records.len() + 1);
    rows.push(SUMMARY_HEADERS.iter().map(|h| Cell::text(*h)).collect());

    for record in records {
        rows.push(
            [
                &record.document_id,
                &record.internal_id,
                &record.issue_date,
                &record.document_type,
                &record.document_version,
                &record.total_amount,
                &record.supplier_name,
                &record.supplier_tax_id,
                &record.receiver_name,
                &record.receiver_tax_id,
                &record.submission_id,
                &record.status,
                &record.page_number,
            ]
            .into_iter()
            .map(|field| Cell::from(text(field)))
            .collect(),
        );
    }

    Sheet {
        name: sheet_name(SUMMARY_SHEET),
        rows,
        column_widths: SUMMARY_WIDTHS.to_vec(),
        header_style: Some(SUMMARY_HEADER_STYLE),
    }
}

/// 明细表: 表头, 发票概要行, 空行, 明细行, 合计行
fn detail_sheet(ordinal: usize, record: &InvoiceRecord) -> Sheet {
    let items = record.details.as_deref().unwrap_or_default();
    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(items.len() + 4);

    rows.push(DETAIL_HEADERS.iter().map(|h| Cell::text(*h)).collect());

    let invoice_no = match text(&record.internal_id) {
        "" => ordinal.to_string(),
        id => id.to_string(),
    };
    let mut context_row = vec![
        Cell::text(format!("فاتورة رقم: {}", invoice_no)),
        Cell::text(format!("التاريخ: {}", text(&record.issue_date))),
        Cell::text(format!("المورد: {}", text(&record.supplier_name))),
        Cell::text(format!("العميل: {}", text(&record.receiver_name))),
        Cell::text(format!("الإجمالي: {} EGP", text(&record.total_amount))),
    ];
    context_row.resize(DETAIL_HEADERS.len(), Cell::Empty);
    rows.push(context_row);

    rows.push(vec![Cell::Empty; DETAIL_HEADERS.len()]);

    for item in items {
        rows.push(
            [
                &item.name,
                &item.unit_code,
                &item.unit_name,
                &item.quantity,
                &item.price,
                &item.value,
                &item.tax,
                &item.total,
            ]
            .into_iter()
            .map(|field| Cell::from(text(field)))
            .collect(),
        );
    }

    let total_value: f64 = items.iter().map(|i| parse_number(text(&i.value))).sum();
    let total_tax: f64 = items.iter().map(|i| parse_number(text(&i.tax))).sum();
    let mut totals_row = vec![Cell::Empty; 4];
    totals_row.extend([
        Cell::text("الإجمالي:"),
        Cell::text(round2(total_value)),
        Cell::text(round2(total_tax)),
        Cell::text(round2(total_value + total_tax)),
    ]);
    rows.push(totals_row);

    Sheet {
        name: sheet_name(&format!("{}{}", DETAIL_SHEET_PREFIX, ordinal)),
        rows,
        column_widths: DETAIL_WIDTHS.to_vec(),
        header_style: Some(DETAIL_HEADER_STYLE),
    }
}

fn statistics_sheet(count: usize, scope: ExportScope, context: &ExportContext, stats: &Statistics) -> Sheet {
    let blank = || vec![Cell::Empty, Cell::Empty];
    let label = |l: &str| vec![Cell::text(l), Cell::Empty];
    let money = |v: f64| Cell::text(format!("{} EGP", round2(v)));

    let mut rows = vec![
        label("إحصائيات الفواتير"),
        blank(),
        vec![Cell::text("إجمالي عدد الفواتير"), Cell::Number(count as f64)],
        vec![Cell::text("إجمالي قيمة الفواتير"), money(stats.total_value)],
        vec![Cell::text("إجمالي ضريبة القيمة المضافة"), money(stats.total_vat)],
        vec![Cell::text("متوسط قيمة الفاتورة"), money(stats.average_value)],
        blank(),
        label("إحصائيات حسب الحالة"),
    ];
    rows.extend(
        stats
            .status_counts
            .iter()
            .map(|(status, n)| vec![Cell::text(status.as_str()), Cell::Number(*n as f64)]),
    );
    rows.push(blank());
    rows.push(label("إحصائيات حسب النوع"));
    rows.extend(
        stats
            .type_counts
            .iter()
            .map(|(kind, n)| vec![Cell::text(kind.as_str()), Cell::Number(*n as f64)]),
    );
    rows.push(blank());
    rows.push(vec![
        Cell::text("تاريخ التصدير"),
        Cell::text(
            context
                .exported_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        ),
    ]);
    rows.push(vec![
        Cell::text("نوع التصدير"),
        Cell::text(match scope {
            ExportScope::AllPages => "جميع الصفحات",
            ExportScope::CurrentPage => "الصفحة الحالية",
        }),
    ]);

    Sheet {
        name: sheet_name(STATISTICS_SHEET),
        rows,
        column_widths: vec![25, 20],
        header_style: None,
    }
}

/// 结构化文档: 无损保留全部记录 (含明细)
pub fn assemble_structured(
    records: &[InvoiceRecord],
    options: &ExportOptions,
    context: &ExportContext,
    stats: Statistics,
) -> StructuredDocument {
    StructuredDocument {
        name: artifact_stem(options.scope(), context, "%Y-%m-%d"),
        export_date: context.exported_at,
        total_count: records.len(),
        export_type: options.scope(),
        total_pages: context.total_pages,
        current_page: context.current_page,
        options: *options,
        statistics: stats,
        invoices: records.to_vec(),
    }
}
