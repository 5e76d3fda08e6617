use eta_invoice_exporter::{
    api::{self, AppState},
    models::PageSnapshot,
    sink::{CsvWorkbookSink, JsonFileSink},
    source::JsonDirSource,
    status::{ProgressReporter, StatusBoard},
    AppConfig, ExportOrchestrator,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置: 默认值 -> 配置文件 -> 环境变量
    let config_path = std::env::var("ETA_EXPORTER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config/exporter.toml"));
    let config = AppConfig::load(Some(&config_path))?;
    info!("Starting server with config: {:?}", config);

    // 数据源与输出端
    let source = Arc::new(JsonDirSource::new(&config.source.dir, &config.source.host));
    let tabular_sink = Arc::new(CsvWorkbookSink::new(&config.export.output_dir));
    let structured_sink = Arc::new(JsonFileSink::new(&config.export.output_dir));

    // 状态面板消费编排器上报的事件
    let board = Arc::new(StatusBoard::new(config.export.status_clear_after()));
    let (reporter, rx) = ProgressReporter::channel();
    board.clone().listen(rx);

    let orchestrator = Arc::new(ExportOrchestrator::new(
        source,
        tabular_sink,
        structured_sink,
        reporter,
        config.export.pipeline_settings(),
    ));

    // 启动时加载一次当前页, 失败时以空快照启动
    let page = match orchestrator.load_current_page().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("当前页加载失败, 可通过 POST /api/page/reload 重试: {}", e);
            PageSnapshot::default()
        }
    };

    let app = api::router(AppState::new(orchestrator, board, page)).layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /api/status       - export status and progress");
    info!("  POST /api/page/reload  - reload current page");
    info!("  POST /api/export       - export invoices");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
