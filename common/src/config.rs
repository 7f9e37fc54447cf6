use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::frame::{
    DEFAULT_JPEG_QUALITY, DEFAULT_POLL_INTERVAL_MS, MAX_FRAME_SIZE, MAX_UPLOAD_WIDTH,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub loadtest: LoadTestConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_web_root")]
    pub web_root: String,
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_interval_ms")]
    pub upload_interval_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub download_interval_ms: u64,
    #[serde(default = "default_max_upload_width")]
    pub max_upload_width: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: f64,
    /// Directory the headless client writes downloaded frames into.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_source_width")]
    pub source_width: u32,
    #[serde(default = "default_source_height")]
    pub source_height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadTestConfig {
    #[serde(default = "default_loadtest_url")]
    pub url: String,
    #[serde(default = "default_total_requests")]
    pub total_requests: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            web_root: default_web_root(),
            max_frame_bytes: default_max_frame_bytes(),
            max_request_bytes: default_max_request_bytes(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            upload_interval_ms: default_interval_ms(),
            download_interval_ms: default_interval_ms(),
            max_upload_width: default_max_upload_width(),
            jpeg_quality: default_jpeg_quality(),
            output_dir: default_output_dir(),
            source_width: default_source_width(),
            source_height: default_source_height(),
        }
    }
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            url: default_loadtest_url(),
            total_requests: default_total_requests(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        let config = Self::parse(&content)?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse fine but cannot drive the loops.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.client.upload_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "client.upload_interval_ms must be greater than zero".into(),
            ));
        }
        if self.client.download_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "client.download_interval_ms must be greater than zero".into(),
            ));
        }
        if self.client.max_upload_width == 0 {
            return Err(ConfigError::Invalid(
                "client.max_upload_width must be greater than zero".into(),
            ));
        }
        if self.loadtest.total_requests == 0 {
            return Err(ConfigError::Invalid(
                "loadtest.total_requests must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl LoadTestConfig {
    /// Worker count actually used: never more workers than requests.
    pub fn effective_concurrency(&self) -> u64 {
        self.concurrency.min(self.total_requests).max(1)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// Default value functions
fn default_bind() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_web_root() -> String {
    "web/static".into()
}
fn default_max_frame_bytes() -> usize {
    MAX_FRAME_SIZE
}
fn default_max_request_bytes() -> usize {
    3 * 1024 * 1024
}
fn default_server_url() -> String {
    "http://127.0.0.1:8080".into()
}
fn default_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_max_upload_width() -> u32 {
    MAX_UPLOAD_WIDTH
}
fn default_jpeg_quality() -> f64 {
    DEFAULT_JPEG_QUALITY
}
fn default_output_dir() -> String {
    "frames".into()
}
fn default_source_width() -> u32 {
    1280
}
fn default_source_height() -> u32 {
    720
}
fn default_loadtest_url() -> String {
    "http://127.0.0.1:8080/".into()
}
fn default_total_requests() -> u64 {
    1000
}
fn default_concurrency() -> u64 {
    100
}
fn default_timeout_secs() -> u64 {
    5
}
fn default_log_level() -> String {
    "info".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_frame_bytes, 2 * 1024 * 1024);
        assert_eq!(config.client.upload_interval_ms, 100);
        assert_eq!(config.client.download_interval_ms, 100);
        assert_eq!(config.client.max_upload_width, 640);
        assert!((config.client.jpeg_quality - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.loadtest.total_requests, 1000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [server]
            port = 9000

            [client]
            server_url = "http://relay.local:9000"
            jpeg_quality = 0.8
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.listen_addr(), "0.0.0.0:9000");
        assert_eq!(config.client.server_url, "http://relay.local:9000");
        assert_eq!(config.client.upload_interval_ms, 100);
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = Config::parse("[server\nport = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_polling_interval_is_rejected() {
        let err = Config::parse("[client]\nupload_interval_ms = 0").unwrap_err();
        assert!(matches!(&err, ConfigError::Invalid(msg) if msg.contains("upload_interval_ms")));

        let err = Config::parse("[client]\ndownload_interval_ms = 0").unwrap_err();
        assert!(matches!(&err, ConfigError::Invalid(msg) if msg.contains("download_interval_ms")));
    }

    #[test]
    fn zero_upload_width_is_rejected() {
        let err = Config::parse("[client]\nmax_upload_width = 0").unwrap_err();
        assert!(matches!(&err, ConfigError::Invalid(msg) if msg.contains("max_upload_width")));
        assert!(err.to_string().starts_with("invalid config:"));
    }

    #[test]
    fn zero_load_test_requests_is_rejected() {
        let err = Config::parse("[loadtest]\ntotal_requests = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::load(Path::new("/definitely/not/here/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile(..)));
    }

    #[test]
    fn concurrency_clamped_to_total() {
        let cfg = LoadTestConfig {
            total_requests: 10,
            concurrency: 100,
            ..LoadTestConfig::default()
        };
        assert_eq!(cfg.effective_concurrency(), 10);
    }
}
