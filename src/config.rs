//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{normalize_base_url, DEFAULT_API_BASE};
use crate::leaderboard::REFRESH_DELAY_MS;
use crate::push::{parse_transport_list, PushConfig, TransportKind, DEFAULT_TRANSPORTS};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub push: PushSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_refresh_delay")]
    pub refresh_delay_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_refresh_delay() -> u64 {
    REFRESH_DELAY_MS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            refresh_delay_ms: default_refresh_delay(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }
}

/// Push channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PushSettings {
    #[serde(default = "default_push_enabled")]
    pub enabled: bool,

    #[serde(default = "default_transports")]
    pub transports: Vec<TransportKind>,

    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
}

fn default_push_enabled() -> bool {
    true
}

fn default_transports() -> Vec<TransportKind> {
    DEFAULT_TRANSPORTS.to_vec()
}

fn default_reconnect_attempts() -> u32 {
    5
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            enabled: default_push_enabled(),
            transports: default_transports(),
            reconnect_attempts: default_reconnect_attempts(),
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

impl LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub fn filter_directive(&self) -> String {
        format!("humble_heroes={},heroes={}", self.level, self.level)
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })?;
        config.api.base_url = normalize_base_url(&config.api.base_url);
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
            dirs::config_dir().map(|p| p.join("humble-heroes").join("config.toml")),
            Some(PathBuf::from("./heroes.toml")),
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

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (the process environment in practice)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("HEROES_API_BASE_URL") {
            self.api.base_url = normalize_base_url(&url);
        }
        if let Some(timeout) = lookup("HEROES_REQUEST_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.api.request_timeout_secs = t;
            }
        }
        if let Some(delay) = lookup("HEROES_REFRESH_DELAY_MS") {
            if let Ok(d) = delay.parse() {
                self.api.refresh_delay_ms = d;
            }
        }

        if let Some(transports) = lookup("HEROES_PUSH_TRANSPORTS") {
            match parse_transport_list(&transports) {
                Ok(list) if !list.is_empty() => self.push.transports = list,
                Ok(_) => {}
                Err(e) => tracing::warn!("Ignoring HEROES_PUSH_TRANSPORTS: {}", e),
            }
        }

        if let Some(level) = lookup("HEROES_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("HEROES_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Push-channel settings for the configured API
    pub fn push_config(&self) -> PushConfig {
        PushConfig::new(&self.api.base_url)
            .transports(self.push.transports.clone())
            .reconnect_attempts(self.push.reconnect_attempts)
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
    r#"# Humble Heroes Configuration
#
# Environment variables override these settings:
# - HEROES_API_BASE_URL
# - HEROES_REQUEST_TIMEOUT_SECS
# - HEROES_REFRESH_DELAY_MS
# - HEROES_PUSH_TRANSPORTS (comma separated)
# - HEROES_LOG_LEVEL
# - HEROES_LOG_FORMAT

[api]
# Origin of the superhero API
base_url = "http://localhost:3000"

# Request timeout in seconds
request_timeout_secs = 10

# Wait before re-reading the leaderboard after adding a hero (ms)
refresh_delay_ms = 500

[push]
# Listen for newly created heroes
enabled = true

# Transports to try, in order
transports = ["websocket", "polling"]

# Reconnect attempts after the channel drops
reconnect_attempts = 5

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
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.api.refresh_delay(), Duration::from_millis(500));
        assert_eq!(config.push.transports, DEFAULT_TRANSPORTS.to_vec());
        assert!(config.push.enabled);
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::from_toml(&generate_default_config()).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.api.request_timeout_secs, 10);
        assert_eq!(config.push.reconnect_attempts, 5);
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"https://heroes.example.com/\"\n[push]\ntransports = [\"polling\"]").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.api.base_url, "https://heroes.example.com");
        assert_eq!(config.api.refresh_delay_ms, 500);
        assert_eq!(config.push.transports, vec![TransportKind::Polling]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_errors() {
        let missing = Config::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nbase_url = 3").unwrap();
        let broken = Config::load(file.path());
        match broken {
            Err(ConfigError::Parse { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("HEROES_API_BASE_URL", "http://10.0.0.5:4000/"),
            ("HEROES_REFRESH_DELAY_MS", "50"),
            ("HEROES_REQUEST_TIMEOUT_SECS", "not-a-number"),
            ("HEROES_PUSH_TRANSPORTS", "polling,websocket"),
            ("HEROES_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "http://10.0.0.5:4000");
        assert_eq!(config.api.refresh_delay_ms, 50);
        assert_eq!(config.api.request_timeout_secs, 10);
        assert_eq!(
            config.push.transports,
            vec![TransportKind::Polling, TransportKind::Websocket]
        );
        assert!(config.logging.is_json());

        let push = config.push_config();
        assert_eq!(push.base_url, "http://10.0.0.5:4000");
        assert_eq!(push.transports[0], TransportKind::Polling);
    }
}
