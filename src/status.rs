use crate::models::{ExportEvent, HarvestProgress, StatusKind, StatusMessage};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// 进度/状态上报句柄, 发送即忘, 无背压
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    tx: Option<mpsc::UnboundedSender<ExportEvent>>,
}

impl ProgressReporter {
    pub fn new(tx: mpsc::UnboundedSender<ExportEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// 不上报任何事件
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn progress(&self, progress: HarvestProgress) {
        self.send(ExportEvent::Progress(progress));
    }

    pub fn status(&self, kind: StatusKind, message: impl Into<String>) {
        self.send(ExportEvent::Status(StatusMessage::new(kind, message)));
    }

    pub fn loading(&self, message: impl Into<String>) {
        self.status(StatusKind::Loading, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.status(StatusKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.status(StatusKind::Error, message);
    }

    fn send(&self, event: ExportEvent) {
        if let Some(tx) = &self.tx {
            // 接收端关闭时直接丢弃
            let _ = tx.send(event);
        }
    }
}

/// 进度条视图
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub current_page: u32,
    pub total_pages: u32,
    pub percentage: f64,
    pub message: String,
}

/// 状态面板快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub busy: bool,
    pub status: Option<StatusMessage>,
    pub progress: Option<ProgressView>,
}

#[derive(Debug, Default)]
struct BoardState {
    status: Option<(StatusMessage, Instant)>,
    progress: Option<HarvestProgress>,
}

/// 状态面板: 只保留最新的状态与进度
#[derive(Debug)]
pub struct StatusBoard {
    state: Mutex<BoardState>,
    clear_after: Duration,
}

impl StatusBoard {
    pub fn new(clear_after: Duration) -> Self {
        Self {
            state: Mutex::new(BoardState::default()),
            clear_after,
        }
    }

    pub fn apply(&self, event: ExportEvent) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match event {
            ExportEvent::Progress(progress) => state.progress = Some(progress),
            ExportEvent::Status(status) => state.status = Some((status, Instant::now())),
        }
    }

    /// 读取当前状态. success/error 超时后清除, 但有导出进行中时保留;
    /// 进度只在导出进行中可见
    pub fn snapshot(&self, busy: bool) -> StatusSnapshot {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let expired = state
            .status
            .as_ref()
            .is_some_and(|(status, at)| status.is_transient() && at.elapsed() >= self.clear_after);
        if expired && !busy {
            state.status = None;
        }
        if !busy {
            state.progress = None;
        }

        StatusSnapshot {
            busy,
            status: state.status.as_ref().map(|(status, _)| status.clone()),
            progress: state.progress.as_ref().map(|p| ProgressView {
                current_page: p.current_page,
                total_pages: p.total_pages,
                percentage: p.percentage(),
                message: p.message.clone(),
            }),
        }
    }

    /// 启动事件消费任务, 发送端全部关闭后结束
    pub fn listen(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<ExportEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                self.apply(event);
            }
            tracing::debug!("status channel closed");
        })
    }
}
