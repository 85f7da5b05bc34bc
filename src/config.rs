//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::chart::{ChartContext, LabelPolicy, Palette, PublishSettings};
use crate::client::ClientConfig;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub chart: ChartConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chart service connection
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API token; usually supplied through `DWCHART_TOKEN`
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "https://api.datawrapper.de".to_string()
}

fn default_request_timeout() -> u64 {
    30000 // 30 seconds
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl ServiceConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            request_timeout_ms: self.request_timeout_ms,
        }
    }
}

/// Defaults shared by every published chart
#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_chart_size")]
    pub height: u32,

    #[serde(default = "default_chart_size")]
    pub width: u32,

    /// Colour indices handed out to series in order
    #[serde(default = "default_palette")]
    pub palette: Vec<u32>,

    #[serde(default)]
    pub palette_offset: usize,

    /// Series count above which labels move to the top
    #[serde(default = "default_label_threshold")]
    pub label_threshold: usize,

    /// Header of the time axis column
    #[serde(default = "default_index_label")]
    pub index_label: String,
}

fn default_chart_size() -> u32 {
    600
}

fn default_palette() -> Vec<u32> {
    Palette::default().colors
}

fn default_label_threshold() -> usize {
    1
}

fn default_index_label() -> String {
    "date".to_string()
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            height: default_chart_size(),
            width: default_chart_size(),
            palette: default_palette(),
            palette_offset: 0,
            label_threshold: default_label_threshold(),
            index_label: default_index_label(),
        }
    }
}

impl ChartConfig {
    /// Rendering context for a run on `today`
    pub fn context(&self, today: NaiveDate) -> ChartContext {
        ChartContext {
            today,
            publish: PublishSettings {
                height: self.height,
                width: self.width,
            },
            palette: Palette::new(self.palette.clone(), self.palette_offset),
            label_policy: LabelPolicy::new(self.label_threshold),
            index_label: self.index_label.clone(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("dwchart").join("config.toml")),
            Some(PathBuf::from("./dwchart.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Service overrides
        if let Some(url) = lookup("DWCHART_API_URL") {
            self.service.base_url = url;
        }
        if let Some(token) = lookup("DWCHART_TOKEN") {
            self.service.token = token;
        }

        // Logging overrides
        if let Some(level) = lookup("DWCHART_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("DWCHART_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# dwchart Configuration
#
# Environment variables override these settings:
# - DWCHART_API_URL
# - DWCHART_TOKEN
# - DWCHART_LOG_LEVEL
# - DWCHART_LOG_FORMAT

[service]
# Chart service API base URL
base_url = "https://api.datawrapper.de"

# API token (prefer DWCHART_TOKEN)
token = ""

# Request timeout in milliseconds
request_timeout_ms = 30000

[chart]
# Published chart size in pixels
height = 600
width = 600

# Colour indices assigned to series in order, starting at palette_offset
palette = [7, 2, 9, 5, 6, 8, 2, 10]
palette_offset = 0

# Series count above which labels are placed on top
label_threshold = 1

# Header of the time axis column
index_label = "date"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.service.base_url, "https://api.datawrapper.de");
        assert_eq!(config.service.request_timeout_ms, 30000);
        assert_eq!(config.chart.palette, vec![7, 2, 9, 5, 6, 8, 2, 10]);
        assert_eq!(config.chart.label_threshold, 1);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.chart.height, 600);
        assert_eq!(config.chart.index_label, "date");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[service]\ntoken = \"abc\"\n\n[chart]\nheight = 400\npalette = [1, 2]\npalette_offset = 1"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.service.token, "abc");
        assert_eq!(config.service.base_url, "https://api.datawrapper.de");
        assert_eq!(config.chart.height, 400);
        assert_eq!(config.chart.width, 600);

        let ctx = config.chart.context(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(ctx.palette.color_for(0), Some(2));
        assert_eq!(ctx.publish.height, 400);

        let client = config.service.client_config();
        assert_eq!(client.token, "abc");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Io { .. })));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[chart\nheight = ").unwrap();
        assert!(matches!(Config::load(&broken), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DWCHART_API_URL", "http://localhost:9000"),
            ("DWCHART_TOKEN", "secret"),
            ("DWCHART_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.service.base_url, "http://localhost:9000");
        assert_eq!(config.service.token, "secret");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }
}
