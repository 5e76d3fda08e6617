pub mod handlers;

pub use handlers::*;

use crate::models::PageSnapshot;
use crate::service::ExportOrchestrator;
use crate::status::StatusBoard;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// 共享状态: 编排器, 状态面板, 当前页快照
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ExportOrchestrator>,
    pub board: Arc<StatusBoard>,
    pub page: Arc<RwLock<PageSnapshot>>,
}

impl AppState {
    pub fn new(orchestrator: Arc<ExportOrchestrator>, board: Arc<StatusBoard>, page: PageSnapshot) -> Self {
        Self {
            orchestrator,
            board,
            page: Arc::new(RwLock::new(page)),
        }
    }
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/status", get(export_status))
        .route("/api/page/reload", post(reload_page))
        .route("/api/export", post(export))
        .with_state(state)
}
