use crate::service::PipelineSettings;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 环境变量前缀, 如 ETA_EXPORTER__SERVER__PORT=9000
pub const ENV_PREFIX: &str = "ETA_EXPORTER";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 页面数据目录及其所属主机
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub dir: PathBuf,
    pub host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub supported_host: String,
    /// 明细请求间隔 (毫秒)
    pub request_delay_ms: u64,
    /// 全量抓取的页数上限
    pub max_pages: u32,
    /// 成功/错误提示自动清除 (秒)
    pub status_clear_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            source: SourceConfig {
                dir: PathBuf::from("data"),
                host: "https://invoicing.eta.gov.eg/documents".to_string(),
            },
            export: ExportConfig {
                output_dir: PathBuf::from("exports"),
                supported_host: "invoicing.eta.gov.eg".to_string(),
                request_delay_ms: 100,
                max_pages: 500,
                status_clear_secs: 3,
            },
        }
    }
}

impl AppConfig {
    /// 依次叠加: 默认值 -> 配置文件 (可缺省) -> 环境变量
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// 仅从环境变量加载配置
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            source: SourceConfig {
                dir: std::env::var("ETA_SOURCE_DIR").map(PathBuf::from).unwrap_or(defaults.source.dir),
                host: std::env::var("ETA_SOURCE_HOST").unwrap_or(defaults.source.host),
            },
            export: ExportConfig {
                output_dir: std::env::var("ETA_OUTPUT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.export.output_dir),
                ..defaults.export
            },
        }
    }
}

impl ExportConfig {
    pub fn status_clear_after(&self) -> Duration {
        Duration::from_secs(self.status_clear_secs)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            supported_host: self.supported_host.clone(),
            request_delay: Duration::from_millis(self.request_delay_ms),
            max_pages: self.max_pages,
        }
    }
}
