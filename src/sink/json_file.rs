use super::StructuredSink;
use crate::error::SinkError;
use crate::models::StructuredDocument;
use async_trait::async_trait;
use std::path::PathBuf;

/// 结构化文档输出为 `<name>.json` (缩进格式)
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    output_dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl StructuredSink for JsonFileSink {
    async fn write(&self, document: &StructuredDocument) -> Result<PathBuf, SinkError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(format!("{}.json", document.name));
        let body = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(&path, &body).await?;
        tracing::info!("✓ JSON 导出完成: {} 条 -> {} ({} bytes)", document.total_count, path.display(), body.len());
        Ok(path)
    }
}
