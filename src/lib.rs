pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod sink;
pub mod source;
pub mod status;

pub use config::AppConfig;
pub use error::{ExportError, Result};
pub use service::{ExportOrchestrator, ExportRequest, PipelineSettings};
