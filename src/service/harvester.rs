use crate::error::{ExportError, Result};
use crate::models::{HarvestProgress, InvoiceRecord};
use crate::source::PageSource;
use crate::status::ProgressReporter;
use indexmap::IndexSet;

/// 分页抓取结果
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    pub records: Vec<InvoiceRecord>,
    /// 最后一次响应报告的总页数
    pub total_pages: u32,
    pub pages_fetched: u32,
}

/// 分页抓取器: 从第 1 页开始逐页拉取, 全有或全无
#[derive(Debug, Clone)]
pub struct PageHarvester {
    max_pages: u32,
}

impl PageHarvester {
    pub fn new(max_pages: u32) -> Self {
        Self {
            max_pages: max_pages.max(1),
        }
    }

    pub async fn harvest_all(
        &self,
        source: &dyn PageSource,
        reporter: &ProgressReporter,
    ) -> Result<HarvestOutcome> {
        let mut records: Vec<InvoiceRecord> = Vec::new();
        let mut seen_uuids: IndexSet<String> = IndexSet::new();
        let mut page = 1u32;

        loop {
            // 1. 拉取当前页, success=false 与调用失败同样处理
            let response = source
                .fetch_page(page)
                .await
                .and_then(|r| r.into_result())
                .map_err(|e| {
                    tracing::error!("第 {} 页加载失败, 丢弃已抓取的 {} 条记录: {}", page, records.len(), e);
                    ExportError::Harvest { page, source: e }
                })?;

            // 2. 每页重新读取总页数
            let total_pages = response.total_pages.max(1);
            if response.current_page != 0 && response.current_page != page {
                tracing::debug!("请求第 {} 页, 数据源报告第 {} 页", page, response.current_page);
            }

            // 3. 追加记录 (页序, 页内顺序)
            let row_count = response.rows.len();
            for mut row in response.rows {
                if row.page_number.as_deref().map_or(true, str::is_empty) {
                    row.page_number = Some(page.to_string());
                }
                if !seen_uuids.insert(row.uuid.clone()) {
                    tracing::warn!("重复的发票 uuid {} (第 {} 页)", row.uuid, page);
                }
                records.push(row);
            }

            tracing::debug!("第 {}/{} 页: {} 条, 累计 {} 条", page, total_pages, row_count, records.len());
            reporter.progress(HarvestProgress::new(
                page,
                total_pages,
                format!("Page {} of {} loaded ({} invoices)", page, total_pages, records.len()),
            ));

            // 4. 终止条件
            if !response.has_next || page >= total_pages {
                tracing::info!("分页抓取完成: {} 页, {} 条记录", page, records.len());
                return Ok(HarvestOutcome {
                    records,
                    total_pages,
                    pages_fetched: page,
                });
            }
            if page >= self.max_pages {
                tracing::warn!(
                    "达到页数上限 {}, 数据源报告共 {} 页, 停止抓取",
                    self.max_pages, total_pages
                );
                return Ok(HarvestOutcome {
                    records,
                    total_pages,
                    pages_fetched: page,
                });
            }

            page += 1;
        }
    }
}
