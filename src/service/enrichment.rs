use crate::models::InvoiceRecord;
use crate::source::PageSource;
use crate::status::ProgressReporter;
use std::time::Duration;

/// 明细补全结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub attached: usize,
    pub failed: usize,
}

/// 明细补全: 按 uuid 逐张串行拉取, 单张失败不影响整体
#[derive(Debug, Clone)]
pub struct DetailEnricher {
    request_delay: Duration,
}

impl DetailEnricher {
    pub fn new(request_delay: Duration) -> Self {
        Self { request_delay }
    }

    pub async fn enrich(
        &self,
        records: &mut [InvoiceRecord],
        source: &dyn PageSource,
        reporter: &ProgressReporter,
    ) -> EnrichmentSummary {
        let total = records.len();
        let mut summary = EnrichmentSummary::default();

        for (idx, record) in records.iter_mut().enumerate() {
            // 相邻两次请求之间限速
            if idx > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }

            reporter.loading(format!("Fetching details for invoice {} of {}...", idx + 1, total));

            match source
                .fetch_details(&record.uuid)
                .await
                .and_then(|r| r.into_result())
            {
                Ok(items) => {
                    record.details = Some(items);
                    summary.attached += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to load details for invoice {}: {}", record.uuid, e);
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            "明细补全完成: {} 张, 成功 {}, 失败 {}",
            total, summary.attached, summary.failed
        );
        summary
    }
}
