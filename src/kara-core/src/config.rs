use crate::paths::AppDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            server: ServerConfig::default(),
            polling: PollingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Raw `name=value` session cookie sent with every request.
    #[serde(default)]
    pub session_cookie: Option<String>,
    /// Seed value for the `csrftoken` cookie when the server has not set one yet.
    #[serde(default)]
    pub csrf_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_cookie: None,
            csrf_token: None,
        }
    }
}

impl ServerConfig {
    /// Base URL with a guaranteed trailing slash so relative joins keep the
    /// mount prefix.
    pub fn parsed_base_url(&self) -> Result<Url, url::ParseError> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Poll cycles a pending control command may stay unconfirmed.
    #[serde(default = "default_pending_timeout_ticks")]
    pub pending_timeout_ticks: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            pending_timeout_ticks: default_pending_timeout_ticks(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
    #[serde(default = "default_stdout_enabled")]
    pub stdout: bool,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_log_files: default_max_log_files(),
            stdout: default_stdout_enabled(),
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config validation failed: {0}")]
    Validation(ValidationError),
    #[error("failed to prepare configuration directories: {0}")]
    Directories(#[from] crate::paths::DirsError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unsupported config_version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("invalid server.base_url {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("polling.interval_ms must be greater than zero")]
    ZeroInterval,
    #[error("polling.pending_timeout_ticks must be greater than zero")]
    ZeroPendingTimeout,
}

impl Config {
    pub fn load_or_default(dirs: &AppDirs) -> Result<Self, ConfigError> {
        dirs.ensure_exists()?;
        let path = Self::config_path(dirs);
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    pub fn config_path(dirs: &AppDirs) -> PathBuf {
        dirs.config_dir().join("config.toml")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version != CURRENT_CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }
        self.server
            .parsed_base_url()
            .map_err(|source| ValidationError::InvalidBaseUrl {
                url: self.server.base_url.clone(),
                source,
            })?;
        if self.polling.interval_ms == 0 {
            return Err(ValidationError::ZeroInterval);
        }
        if self.polling.pending_timeout_ticks == 0 {
            return Err(ValidationError::ZeroPendingTimeout);
        }
        Ok(())
    }

    /// Apply a command-line server override, re-validating the result.
    pub fn with_base_url(mut self, base_url: Option<&str>) -> Result<Self, ValidationError> {
        if let Some(url) = base_url {
            self.server.base_url = url.to_string();
            self.validate()?;
        }
        Ok(self)
    }
}

fn default_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

fn default_base_url() -> String {
    "http://localhost:8000/".into()
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_pending_timeout_ticks() -> u32 {
    10
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_max_log_files() -> usize {
    7
}

fn default_stdout_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.polling.interval(), Duration::from_millis(1000));
        assert_eq!(config.polling.pending_timeout_ticks, 10);
        assert_eq!(config.logging.max_log_files, 7);
        assert!(config.logging.stdout);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn invalid_version_rejected() {
        let mut config = Config::default();
        config.config_version = CURRENT_CONFIG_VERSION + 1;
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn zero_interval_rejected() {
        let mut config = Config::default();
        config.polling.interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::ZeroInterval)
        ));
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let server = ServerConfig {
            base_url: "http://kara.local/app".into(),
            ..ServerConfig::default()
        };
        let url = server.parsed_base_url().expect("url should parse");
        assert_eq!(url.as_str(), "http://kara.local/app/");
        assert_eq!(
            url.join("playlist/").unwrap().as_str(),
            "http://kara.local/app/playlist/"
        );
    }

    #[test]
    fn override_rejects_garbage_url() {
        let result = Config::default().with_base_url(Some("not a url"));
        assert!(matches!(
            result,
            Err(ValidationError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            base_url = "http://10.0.0.2:8000/"

            [polling]
            interval_ms = 250
            "#,
        )
        .expect("config should parse");
        assert!(config.validate().is_ok());
        assert_eq!(config.polling.interval_ms, 250);
        assert_eq!(config.polling.pending_timeout_ticks, 10);
        assert!(config.server.session_cookie.is_none());
    }

    #[test]
    fn load_reads_file_from_config_dir() {
        let root = tempfile::tempdir().expect("tempdir");
        let dirs = AppDirs::from_root(root.path());
        dirs.ensure_exists().expect("dirs");
        fs::write(
            Config::config_path(&dirs),
            "[polling]\npending_timeout_ticks = 3\n",
        )
        .expect("write config");

        let config = Config::load_or_default(&dirs).expect("config should load");
        assert_eq!(config.polling.pending_timeout_ticks, 3);
    }

    #[test]
    fn load_rejects_invalid_file() {
        let root = tempfile::tempdir().expect("tempdir");
        let dirs = AppDirs::from_root(root.path());
        dirs.ensure_exists().expect("dirs");
        fs::write(Config::config_path(&dirs), "[polling]\ninterval_ms = 0\n").expect("write");

        let err = Config::load_or_default(&dirs).expect_err("zero interval");
        assert!(matches!(
            err,
            ConfigError::Validation(ValidationError::ZeroInterval)
        ));
    }
}
