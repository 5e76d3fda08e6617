use crate::error::{ExportError, Result};
use crate::models::{
    Document, ExportContext, ExportFormat, ExportOptions, ExportScope, ExportSession, HarvestProgress, PageSnapshot,
    Statistics,
};
use crate::service::assembler;
use crate::service::enrichment::DetailEnricher;
use crate::service::harvester::PageHarvester;
use crate::service::statistics;
use crate::sink::{StructuredSink, TabularSink};
use crate::source::PageSource;
use crate::status::ProgressReporter;
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// 导出状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportState {
    Idle,
    /// 加载当前页快照
    Loading,
    Validating,
    Harvesting,
    Enriching,
    Assembling,
    Emitting,
    Error,
}

/// 流水线参数
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// 数据源主机需包含此串
    pub supported_host: String,
    pub request_delay: Duration,
    pub max_pages: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            supported_host: "invoicing.eta.gov.eg".to_string(),
            request_delay: Duration::from_millis(100),
            max_pages: 500,
        }
    }
}

/// 一次导出请求
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub options: ExportOptions,
    /// 当前页快照, 单页导出时直接使用
    pub current: PageSnapshot,
}

/// 导出结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub artifact: PathBuf,
    pub record_count: usize,
    pub scope: ExportScope,
    pub statistics: Statistics,
}

/// 导出编排器: 同一时间只允许一个导出
pub struct ExportOrchestrator {
    source: Arc<dyn PageSource>,
    tabular_sink: Arc<dyn TabularSink>,
    structured_sink: Arc<dyn StructuredSink>,
    harvester: PageHarvester,
    enricher: DetailEnricher,
    reporter: ProgressReporter,
    supported_host: String,
    state: Mutex<ExportState>,
    /// 当前上下文不受支持时, 本会话内禁用导出
    disabled: AtomicBool,
}

/// 离开作用域时回到 Idle (任何退出路径)
struct IdleGuard<'a> {
    state: &'a Mutex<ExportState>,
}

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = ExportState::Idle;
    }
}

impl ExportOrchestrator {
    pub fn new(
        source: Arc<dyn PageSource>,
        tabular_sink: Arc<dyn TabularSink>,
        structured_sink: Arc<dyn StructuredSink>,
        reporter: ProgressReporter,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            tabular_sink,
            structured_sink,
            harvester: PageHarvester::new(settings.max_pages),
            enricher: DetailEnricher::new(settings.request_delay),
            reporter,
            supported_host: settings.supported_host,
            state: Mutex::new(ExportState::Idle),
            disabled: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ExportState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_busy(&self) -> bool {
        self.state() != ExportState::Idle
    }

    fn transition(&self, next: ExportState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!("export state {:?} -> {:?}", *state, next);
        *state = next;
    }

    /// 占用编排器 (导出与重新加载共用); 非 Idle 时拒绝而不是排队
    fn begin(&self, next: ExportState) -> Result<IdleGuard<'_>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != ExportState::Idle {
            drop(state);
            self.reporter.loading("Still processing... please wait");
            return Err(ExportError::Busy);
        }
        *state = next;
        Ok(IdleGuard { state: &self.state })
    }

    /// 检查数据源是否为受支持的门户页面
    fn ensure_available(&self) -> Result<()> {
        if self.disabled.load(Ordering::SeqCst) {
            return Err(ExportError::SourceUnavailable(format!(
                "please open the e-invoicing portal ({})",
                self.supported_host
            )));
        }
        if !self.source.host().contains(self.supported_host.as_str()) {
            self.disabled.store(true, Ordering::SeqCst);
            tracing::warn!("unsupported source host {}, export disabled", self.source.host());
            return Err(ExportError::SourceUnavailable(format!(
                "please open the e-invoicing portal ({})",
                self.supported_host
            )));
        }
        Ok(())
    }

    /// 加载当前页快照 (流水线外, 每次打开时执行一次)
    pub async fn load_current_page(&self) -> Result<PageSnapshot> {
        let _guard = self.begin(ExportState::Loading)?;
        if let Err(e) = self.ensure_available() {
            self.reporter.error(e.to_string());
            return Err(e);
        }

        self.reporter.loading("Loading invoice data...");
        let snapshot = match self.source.fetch_current_page().await.and_then(|r| r.into_result()) {
            Ok(response) => response.into_snapshot(),
            Err(e) => {
                let err = ExportError::Load(e);
                tracing::error!("Load error: {}", err);
                self.reporter.error(err.to_string());
                return Err(err);
            }
        };

        tracing::info!(
            "当前页 {}/{}: {} 条, 共 {} 条",
            snapshot.current_page,
            snapshot.total_pages,
            snapshot.records.len(),
            snapshot.total_count
        );
        self.reporter.success("Invoice data loaded successfully");
        Ok(snapshot)
    }

    /// 导出入口
    pub async fn export(&self, request: ExportRequest) -> Result<ExportOutcome> {
        let guard = self.begin(ExportState::Validating)?;

        let result = self.run(request).await;
        match &result {
            Ok(outcome) => {
                let message = match outcome.scope {
                    ExportScope::AllPages => {
                        format!("Exported {} invoices from all pages successfully!", outcome.record_count)
                    }
                    ExportScope::CurrentPage => format!("Exported {} invoices successfully!", outcome.record_count),
                };
                tracing::info!("{} -> {}", message, outcome.artifact.display());
                self.reporter.success(message);
            }
            Err(e) => {
                self.transition(ExportState::Error);
                tracing::error!("Export error: {}", e);
                self.reporter.error(format!("Export failed: {}", e));
            }
        }

        drop(guard);
        result
    }

    async fn run(&self, request: ExportRequest) -> Result<ExportOutcome> {
        let ExportRequest {
            format,
            options,
            current,
        } = request;

        // 1. 校验 (尚未发生任何 I/O)
        options.validate()?;
        format.ensure_supported()?;
        self.ensure_available()?;
        if !options.download_all && current.current_page == 0 {
            return Err(ExportError::PageNotLoaded);
        }

        // 2. 选择记录来源
        let (records, total_pages) = if options.download_all {
            self.transition(ExportState::Harvesting);
            self.reporter.loading("Loading all pages...");
            self.reporter
                .progress(HarvestProgress::new(0, current.total_pages, "Starting..."));
            let outcome = self.harvester.harvest_all(self.source.as_ref(), &self.reporter).await?;
            (outcome.records, outcome.total_pages)
        } else {
            self.reporter.loading("Exporting current page...");
            (current.records, current.total_pages)
        };

        let mut session = ExportSession {
            format,
            options,
            context: ExportContext {
                current_page: current.current_page,
                total_pages,
                exported_at: Utc::now(),
            },
            records,
        };

        // 3. 明细补全 (可选)
        if session.options.download_details && !session.records.is_empty() {
            self.transition(ExportState::Enriching);
            if session.options.download_all {
                self.reporter.progress(HarvestProgress::new(
                    total_pages,
                    total_pages,
                    "Loading details for all invoices...",
                ));
            } else {
                self.reporter.loading("Loading invoice details...");
            }
            let summary = self
                .enricher
                .enrich(&mut session.records, self.source.as_ref(), &self.reporter)
                .await;
            if summary.failed > 0 {
                tracing::warn!("{} 张发票明细加载失败, 已保留原记录", summary.failed);
            }
        }

        // 4. 统计 + 组装
        self.transition(ExportState::Assembling);
        if session.options.download_all {
            self.reporter
                .progress(HarvestProgress::new(total_pages, total_pages, "Generating file..."));
        }
        let stats = statistics::compute(&session.records);
        let document = assembler::assemble(
            &session.records,
            session.format,
            &session.options,
            &session.context,
            stats.clone(),
        )
        .ok_or(ExportError::UnsupportedFormat(session.format))?;

        // 5. 交给输出端
        self.transition(ExportState::Emitting);
        let artifact = match &document {
            Document::Tabular(doc) => self.tabular_sink.write(doc).await?,
            Document::Structured(doc) => self.structured_sink.write(doc).await?,
        };

        Ok(ExportOutcome {
            artifact,
            record_count: session.records.len(),
            scope: session.scope(),
            statistics: stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::models::{ExportEvent, InvoiceRecord, StatusKind, StructuredDocument, TabularDocument};
    use crate::sink::{CsvWorkbookSink, JsonFileSink};
    use crate::source::MemorySource;
    use async_trait::async_trait;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::Notify;

    const HOST: &str = "https://invoicing.eta.gov.eg/documents";

    fn settings() -> PipelineSettings {
        PipelineSettings {
            request_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    fn records(prefix: &str, n: usize) -> Vec<InvoiceRecord> {
        (0..n).map(|i| InvoiceRecord::new(format!("{}{}", prefix, i))).collect()
    }

    /// 已加载的第 1 页快照
    fn loaded(records: Vec<InvoiceRecord>) -> PageSnapshot {
        PageSnapshot {
            total_count: records.len() as u64,
            records,
            current_page: 1,
            total_pages: 1,
        }
    }

    fn build(
        source: Arc<MemorySource>,
        dir: &std::path::Path,
    ) -> (ExportOrchestrator, UnboundedReceiver<ExportEvent>) {
        let (reporter, rx) = ProgressReporter::channel();
        let orchestrator = ExportOrchestrator::new(
            source,
            Arc::new(CsvWorkbookSink::new(dir)),
            Arc::new(JsonFileSink::new(dir)),
            reporter,
            settings(),
        );
        (orchestrator, rx)
    }

    fn statuses(rx: &mut UnboundedReceiver<ExportEvent>) -> Vec<(StatusKind, String)> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let ExportEvent::Status(s) = event {
                out.push((s.kind, s.message));
            }
        }
        out
    }

    fn request(format: ExportFormat, options: ExportOptions, current: PageSnapshot) -> ExportRequest {
        ExportRequest {
            format,
            options,
            current,
        }
    }

    #[tokio::test]
    async fn validation_failure_issues_no_source_calls() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MemorySource::new(HOST, vec![records("a", 2)]));
        let (orchestrator, mut rx) = build(source.clone(), temp_dir.path());

        let options = ExportOptions {
            seller_name: true,
            download_all: true,
            download_details: true,
            ..Default::default()
        };
        let err = orchestrator
            .export(request(ExportFormat::Excel, options, PageSnapshot::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Validation));
        assert_eq!(source.calls(), 0);
        assert_eq!(orchestrator.state(), ExportState::Idle);
        let last = statuses(&mut rx).pop().unwrap();
        assert_eq!(last.0, StatusKind::Error);
    }

    #[tokio::test]
    async fn current_page_export_uses_snapshot_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MemorySource::new(HOST, vec![records("a", 2), records("b", 2)]).with_current_page(2));
        let (orchestrator, mut rx) = build(source.clone(), temp_dir.path());

        let snapshot = orchestrator.load_current_page().await.unwrap();
        assert_eq!(snapshot.current_page, 2);
        assert_eq!(snapshot.total_count, 4);
        let calls_after_load = source.calls();

        let options = ExportOptions { id: true, ..Default::default() };
        let outcome = orchestrator
            .export(request(ExportFormat::Json, options, snapshot))
            .await
            .unwrap();

        assert_eq!(source.calls(), calls_after_load);
        assert_eq!(outcome.record_count, 2);
        assert_eq!(outcome.scope, ExportScope::CurrentPage);
        assert!(outcome.artifact.exists());
        assert!(outcome
            .artifact
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("ETA_Invoices_Page2_"));

        let last = statuses(&mut rx).pop().unwrap();
        assert_eq!(last, (StatusKind::Success, "Exported 2 invoices successfully!".to_string()));
    }

    #[tokio::test]
    async fn unsupported_format_produces_no_artifact() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MemorySource::new(HOST, vec![records("a", 1)]));
        let (orchestrator, mut rx) = build(source.clone(), temp_dir.path());

        let options = ExportOptions {
            uuid: true,
            download_all: true,
            ..Default::default()
        };
        let err = orchestrator
            .export(request(ExportFormat::Pdf, options, PageSnapshot::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::UnsupportedFormat(ExportFormat::Pdf)));
        assert_eq!(source.calls(), 0);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
        let (kind, message) = statuses(&mut rx).pop().unwrap();
        assert_eq!(kind, StatusKind::Error);
        assert!(message.contains("PDF export is not available"));
    }

    #[tokio::test]
    async fn harvest_failure_returns_to_idle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MemorySource::new(HOST, vec![records("a", 1), records("b", 1)]).failing_page(2));
        let (orchestrator, _rx) = build(source.clone(), temp_dir.path());

        let options = ExportOptions {
            date: true,
            download_all: true,
            ..Default::default()
        };
        let err = orchestrator
            .export(request(ExportFormat::Excel, options, PageSnapshot::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Harvest { page: 2, .. }));
        assert!(!orchestrator.is_busy());

        // 失败后可以再次导出
        let options = ExportOptions { date: true, ..Default::default() };
        assert!(orchestrator
            .export(request(ExportFormat::Excel, options, loaded(records("a", 1))))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn unsupported_host_disables_exports() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MemorySource::new("https://example.com", vec![records("a", 1)]));
        let (orchestrator, _rx) = build(source.clone(), temp_dir.path());

        assert!(matches!(
            orchestrator.load_current_page().await,
            Err(ExportError::SourceUnavailable(_))
        ));

        let options = ExportOptions { id: true, ..Default::default() };
        let err = orchestrator
            .export(request(ExportFormat::Json, options, PageSnapshot::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::SourceUnavailable(_)));
        assert_eq!(source.calls(), 0);
    }

    /// 阻塞在 Notify 上的输出端, 用于观察进行中的状态
    struct BlockingSink {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl StructuredSink for BlockingSink {
        async fn write(&self, document: &StructuredDocument) -> std::result::Result<PathBuf, SinkError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(PathBuf::from(&document.name))
        }
    }

    struct FailingSink;

    #[async_trait]
    impl TabularSink for FailingSink {
        async fn write(&self, _document: &TabularDocument) -> std::result::Result<PathBuf, SinkError> {
            Err(SinkError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only")))
        }
    }

    #[tokio::test]
    async fn second_export_while_busy_is_rejected() {
        let source = Arc::new(MemorySource::new(HOST, vec![records("a", 1)]));
        let sink = Arc::new(BlockingSink {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let (reporter, mut rx) = ProgressReporter::channel();
        let orchestrator = Arc::new(ExportOrchestrator::new(
            source.clone(),
            Arc::new(FailingSink),
            sink.clone(),
            reporter,
            settings(),
        ));

        let options = ExportOptions { id: true, ..Default::default() };
        let first = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move {
                orchestrator
                    .export(request(ExportFormat::Json, options, loaded(records("a", 1))))
                    .await
            }
        });

        sink.entered.notified().await;
        assert_eq!(orchestrator.state(), ExportState::Emitting);

        let err = orchestrator
            .export(request(ExportFormat::Json, options, loaded(records("a", 1))))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Busy));
        let last = statuses(&mut rx).pop().unwrap();
        assert_eq!(last, (StatusKind::Loading, "Still processing... please wait".to_string()));

        sink.release.notify_one();
        assert!(first.await.unwrap().is_ok());
        assert_eq!(orchestrator.state(), ExportState::Idle);
    }

    #[tokio::test]
    async fn sink_failure_is_reported() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MemorySource::new(HOST, vec![records("a", 1)]));
        let (reporter, mut rx) = ProgressReporter::channel();
        let orchestrator = ExportOrchestrator::new(
            source,
            Arc::new(FailingSink),
            Arc::new(JsonFileSink::new(temp_dir.path())),
            reporter,
            settings(),
        );

        let options = ExportOptions { date: true, ..Default::default() };
        let err = orchestrator
            .export(request(ExportFormat::Excel, options, loaded(records("a", 1))))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Sink(_)));
        assert!(!orchestrator.is_busy());
        let (kind, message) = statuses(&mut rx).pop().unwrap();
        assert_eq!(kind, StatusKind::Error);
        assert!(message.contains("read-only"));
    }

    #[tokio::test]
    async fn reload_while_exporting_is_rejected() {
        let source = Arc::new(MemorySource::new(HOST, vec![records("a", 1)]));
        let sink = Arc::new(BlockingSink {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let (reporter, mut rx) = ProgressReporter::channel();
        let orchestrator = Arc::new(ExportOrchestrator::new(
            source.clone(),
            Arc::new(FailingSink),
            sink.clone(),
            reporter,
            settings(),
        ));

        let first = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move {
                let options = ExportOptions { id: true, ..Default::default() };
                orchestrator
                    .export(request(ExportFormat::Json, options, loaded(records("a", 1))))
                    .await
            }
        });

        sink.entered.notified().await;
        statuses(&mut rx);

        // 导出独占数据源: 重新加载不得发出请求, 也不得覆盖导出状态
        let err = orchestrator.load_current_page().await.unwrap_err();
        assert!(matches!(err, ExportError::Busy));
        assert_eq!(source.calls(), 0);
        assert_eq!(orchestrator.state(), ExportState::Emitting);
        assert_eq!(
            statuses(&mut rx),
            vec![(StatusKind::Loading, "Still processing... please wait".to_string())]
        );

        sink.release.notify_one();
        assert!(first.await.unwrap().is_ok());

        // 导出结束后可以重新加载
        let snapshot = orchestrator.load_current_page().await.unwrap();
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(source.page_calls(), 1);
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn current_page_export_requires_loaded_page() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MemorySource::new(HOST, vec![records("a", 2)]));
        let (orchestrator, mut rx) = build(source.clone(), temp_dir.path());

        let options = ExportOptions { date: true, ..Default::default() };
        let err = orchestrator
            .export(request(ExportFormat::Excel, options, PageSnapshot::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::PageNotLoaded));
        assert_eq!(source.calls(), 0);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
        assert_eq!(statuses(&mut rx).pop().unwrap().0, StatusKind::Error);
        assert!(!orchestrator.is_busy());
    }
}
