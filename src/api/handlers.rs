use super::AppState;
use crate::error::ExportError;
use crate::models::{ExportFormat, ExportOptions};
use crate::service::{ExportOutcome, ExportRequest};
use crate::status::StatusSnapshot;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// 请求体: 导出格式与选项
#[derive(Debug, Deserialize)]
pub struct ExportPayload {
    pub format: ExportFormat,
    #[serde(default)]
    pub options: ExportOptions,
}

/// 导出响应体
#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub success: bool,
    pub message: String,
    pub outcome: Option<ExportOutcome>,
}

/// 当前页概要
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub record_count: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub board: StatusSnapshot,
    pub page: PageSummary,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub message: String,
    pub page: Option<PageSummary>,
}

/// 错误到 HTTP 状态码
pub fn status_code(error: &ExportError) -> StatusCode {
    match error {
        ExportError::Validation => StatusCode::BAD_REQUEST,
        ExportError::Busy => StatusCode::CONFLICT,
        ExportError::PageNotLoaded => StatusCode::PRECONDITION_FAILED,
        ExportError::UnsupportedFormat(_) => StatusCode::NOT_IMPLEMENTED,
        ExportError::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 状态面板 + 当前页概要
pub async fn export_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let board = state.board.snapshot(state.orchestrator.is_busy());
    let page = state.page.read().await;
    Json(StatusResponse {
        board,
        page: PageSummary {
            current_page: page.current_page,
            total_pages: page.total_pages,
            total_count: page.total_count,
            record_count: page.records.len(),
        },
    })
}

/// 重新加载当前页快照
pub async fn reload_page(State(state): State<AppState>) -> Response {
    match state.orchestrator.load_current_page().await {
        Ok(snapshot) => {
            let page = PageSummary {
                current_page: snapshot.current_page,
                total_pages: snapshot.total_pages,
                total_count: snapshot.total_count,
                record_count: snapshot.records.len(),
            };
            *state.page.write().await = snapshot;
            let response = ReloadResponse {
                success: true,
                message: format!("Loaded {} invoices from page {}", page.record_count, page.current_page),
                page: Some(page),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            let response = ReloadResponse {
                success: false,
                message: format!("Error: {}", e),
                page: None,
            };
            (status_code(&e), Json(response)).into_response()
        }
    }
}

/// 导出接口, 同一时间只允许一个导出
pub async fn export(State(state): State<AppState>, Json(req): Json<ExportPayload>) -> Response {
    let current = state.page.read().await.clone();
    let request = ExportRequest {
        format: req.format,
        options: req.options,
        current,
    };

    match state.orchestrator.export(request).await {
        Ok(outcome) => {
            let response = ExportResponse {
                success: true,
                message: format!("Exported {} invoices", outcome.record_count),
                outcome: Some(outcome),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            let response = ExportResponse {
                success: false,
                message: format!("Error: {}", e),
                outcome: None,
            };
            (status_code(&e), Json(response)).into_response()
        }
    }
}
