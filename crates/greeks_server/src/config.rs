//! Server configuration management
//!
//! Handles loading configuration from environment variables, TOML files, and CLI arguments.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use greeks_pipeline::{PipelineConfig, DEFAULT_TIME_FILTER};

/// Environment variable names
pub mod env {
    /// Bind host
    pub const HOST: &str = "GREEKS_SERVER_HOST";
    /// Bind port
    pub const PORT: &str = "GREEKS_SERVER_PORT";
    /// Log level
    pub const LOG_LEVEL: &str = "GREEKS_LOG_LEVEL";
    /// Deployment environment
    pub const ENVIRONMENT: &str = "GREEKS_ENV";
    /// Graceful shutdown timeout
    pub const SHUTDOWN_TIMEOUT_SECS: &str = "GREEKS_SHUTDOWN_TIMEOUT_SECS";
    /// Spot CSV path
    pub const SPOT_CSV: &str = "GREEKS_SPOT_CSV";
    /// Options directory
    pub const OPTIONS_DIR: &str = "GREEKS_OPTIONS_DIR";
    /// Per-series cache TTL
    pub const SERIES_TTL_SECS: &str = "GREEKS_SERIES_TTL_SECS";
    /// Full-result cache TTL
    pub const RESULT_TTL_SECS: &str = "GREEKS_RESULT_TTL_SECS";
}

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid port number: {0}. Must be between 1 and 65535")]
    InvalidPort(u16),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid environment: {0}. Must be one of: development, staging, production")]
    InvalidEnvironment(String),

    #[error("Invalid {name}: must be greater than zero")]
    ZeroDuration { name: &'static str },

    #[error("Invalid asof tolerance: {0}s. Must not be negative")]
    NegativeTolerance(i64),

    #[error("Invalid asof tolerance: {0}s. Out of range")]
    ToleranceOutOfRange(i64),

    #[error("Invalid default rate: {0}. Must be finite")]
    InvalidRate(f64),

    #[error("Default time filter must name at least one HH:MM marker")]
    EmptySchedule,

    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),
}

/// Log levels supported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Input data locations
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Spot series CSV
    pub spot_csv: PathBuf,
    /// Directory of per-instrument option CSVs
    pub options_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            spot_csv: PathBuf::from("data/spot.csv"),
            options_dir: PathBuf::from("data/options"),
        }
    }
}

/// Cache lifetimes
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL of each cached spot/option series
    pub series_ttl_secs: u64,
    /// TTL of each cached full result
    pub result_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            series_ttl_secs: 86_400,
            result_ttl_secs: 3_600,
        }
    }
}

/// Analytics defaults
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Rate used when a request carries none
    pub default_rate: f64,
    /// Asof match tolerance, inclusive
    pub asof_tolerance_secs: i64,
    /// Schedule used when a request names no markers
    pub default_time_filter: Vec<String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_rate: 0.05,
            asof_tolerance_secs: 60,
            default_time_filter: DEFAULT_TIME_FILTER.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Server configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Log level
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
    /// Environment (development, staging, production)
    #[serde(deserialize_with = "deserialize_environment")]
    pub environment: Environment,
    /// Input files
    pub data: DataConfig,
    /// Cache lifetimes
    pub cache: CacheConfig,
    /// Analytics defaults
    pub analytics: AnalyticsConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

fn deserialize_environment<'de, D>(deserializer: D) -> Result<Environment, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Environment::from_str(&s).map_err(serde::de::Error::custom)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: LogLevel::Info,
            shutdown_timeout_secs: 30,
            environment: Environment::Development,
            data: DataConfig::default(),
            cache: CacheConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

fn parse_env<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::EnvError(format!("{name}={raw:?} is not a valid value")))
}

impl ServerConfig {
    /// Create a new ServerConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;

        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Override fields from `GREEKS_*` variables found by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(env::HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(env::PORT) {
            self.port = parse_env(env::PORT, &port)?;
        }
        if let Some(level) = lookup(env::LOG_LEVEL) {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(environment) = lookup(env::ENVIRONMENT) {
            self.environment = Environment::from_str(&environment)?;
        }
        if let Some(timeout) = lookup(env::SHUTDOWN_TIMEOUT_SECS) {
            self.shutdown_timeout_secs = parse_env(env::SHUTDOWN_TIMEOUT_SECS, &timeout)?;
        }
        if let Some(path) = lookup(env::SPOT_CSV) {
            self.data.spot_csv = PathBuf::from(path);
        }
        if let Some(path) = lookup(env::OPTIONS_DIR) {
            self.data.options_dir = PathBuf::from(path);
        }
        if let Some(ttl) = lookup(env::SERIES_TTL_SECS) {
            self.cache.series_ttl_secs = parse_env(env::SERIES_TTL_SECS, &ttl)?;
        }
        if let Some(ttl) = lookup(env::RESULT_TTL_SECS) {
            self.cache.result_ttl_secs = parse_env(env::RESULT_TTL_SECS, &ttl)?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }
        if self.cache.series_ttl_secs == 0 {
            return Err(ConfigError::ZeroDuration {
                name: "cache.series_ttl_secs",
            });
        }
        if self.cache.result_ttl_secs == 0 {
            return Err(ConfigError::ZeroDuration {
                name: "cache.result_ttl_secs",
            });
        }
        if self.analytics.asof_tolerance_secs < 0 {
            return Err(ConfigError::NegativeTolerance(
                self.analytics.asof_tolerance_secs,
            ));
        }
        if chrono::TimeDelta::try_seconds(self.analytics.asof_tolerance_secs).is_none() {
            return Err(ConfigError::ToleranceOutOfRange(
                self.analytics.asof_tolerance_secs,
            ));
        }
        if !self.analytics.default_rate.is_finite() {
            return Err(ConfigError::InvalidRate(self.analytics.default_rate));
        }
        if self
            .analytics
            .default_time_filter
            .iter()
            .all(|m| m.trim().is_empty())
        {
            return Err(ConfigError::EmptySchedule);
        }

        Ok(())
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pipeline settings derived from the cache and analytics sections
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            series_ttl: Duration::from_secs(self.cache.series_ttl_secs),
            result_ttl: Duration::from_secs(self.cache.result_ttl_secs),
            // Out-of-range tolerances are rejected by `validate`
            asof_tolerance: chrono::TimeDelta::try_seconds(self.analytics.asof_tolerance_secs)
                .unwrap_or(chrono::TimeDelta::MAX),
            default_rate: self.analytics.default_rate,
            default_time_filter: self
                .analytics
                .default_time_filter
                .iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(log_level) = &cli.log_level {
            if let Ok(level) = LogLevel::from_str(log_level) {
                self.log_level = level;
            }
        }
        if let Some(path) = &cli.spot_csv {
            self.data.spot_csv = path.clone();
        }
        if let Some(path) = &cli.options_dir {
            self.data.options_dir = path.clone();
        }
    }
}

/// CLI arguments structure
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Host address override
    pub host: Option<String>,
    /// Port override
    pub port: Option<u16>,
    /// Log level override
    pub log_level: Option<String>,
    /// Spot CSV override
    pub spot_csv: Option<PathBuf>,
    /// Options directory override
    pub options_dir: Option<PathBuf>,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn build_config(cli: &CliArgs) -> Result<ServerConfig, ConfigError> {
    build_config_with_env(cli, |name| std::env::var(name).ok())
}

/// [`build_config`] with an explicit environment lookup.
pub fn build_config_with_env<F>(cli: &CliArgs, lookup: F) -> Result<ServerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = if let Some(config_path) = &cli.config_file {
        ServerConfig::from_file(config_path)?
    } else {
        ServerConfig::default()
    };

    config.apply_env(lookup)?;
    config.merge_with_cli(cli);

    // Final validation
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.shutdown_timeout_secs, 30);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.data.spot_csv, PathBuf::from("data/spot.csv"));
        assert_eq!(config.cache.series_ttl_secs, 86_400);
        assert_eq!(config.cache.result_ttl_secs, 3_600);
        assert_eq!(config.analytics.default_time_filter.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("Info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("WARN").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);

        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str("dev").unwrap(),
            Environment::Development
        );
        assert_eq!(
            Environment::from_str("stage").unwrap(),
            Environment::Staging
        );
        assert_eq!(
            Environment::from_str("PROD").unwrap(),
            Environment::Production
        );
        assert!(Environment::from_str("invalid").is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = ServerConfig::default();
        config.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPort(0))));

        let mut config = ServerConfig::default();
        config.cache.result_ttl_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDuration { .. })
        ));

        let mut config = ServerConfig::default();
        config.analytics.asof_tolerance_secs = -1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeTolerance(-1))
        ));

        let mut config = ServerConfig::default();
        config.analytics.asof_tolerance_secs = i64::MAX / 10;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ToleranceOutOfRange(_))
        ));

        let mut config = ServerConfig::default();
        config.analytics.default_time_filter = vec![" ".to_string()];
        assert!(matches!(config.validate(), Err(ConfigError::EmptySchedule)));

        let mut config = ServerConfig::default();
        config.analytics.default_rate = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRate(_))));
    }

    #[test]
    fn test_huge_tolerance_from_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analytics]\nasof_tolerance_secs = {}", i64::MAX / 10).unwrap();

        let cli = CliArgs {
            config_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let err = build_config_with_env(&cli, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::ToleranceOutOfRange(_)));
    }

    #[test]
    fn test_pipeline_config_at_tolerance_limit() {
        let mut config = ServerConfig::default();
        config.analytics.asof_tolerance_secs = i64::MAX / 1000;
        assert!(config.validate().is_ok());
        assert_eq!(
            config.pipeline_config().asof_tolerance,
            chrono::TimeDelta::seconds(i64::MAX / 1000)
        );
    }

    #[test]
    fn test_apply_env() {
        let mut config = ServerConfig::default();
        config
            .apply_env(env_from(&[
                (env::HOST, "127.0.0.1"),
                (env::PORT, "9001"),
                (env::LOG_LEVEL, "debug"),
                (env::ENVIRONMENT, "production"),
                (env::SPOT_CSV, "/srv/spot.csv"),
                (env::OPTIONS_DIR, "/srv/options"),
                (env::SERIES_TTL_SECS, "600"),
                (env::RESULT_TTL_SECS, "60"),
            ]))
            .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9001);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.data.spot_csv, PathBuf::from("/srv/spot.csv"));
        assert_eq!(config.data.options_dir, PathBuf::from("/srv/options"));
        assert_eq!(config.cache.series_ttl_secs, 600);
        assert_eq!(config.cache.result_ttl_secs, 60);
    }

    #[test]
    fn test_apply_env_rejects_garbage() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_env(env_from(&[(env::PORT, "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvError(_)));
        assert!(err.to_string().contains(env::PORT));
    }

    #[test]
    fn test_cli_args_merge() {
        let mut config = ServerConfig::default();
        let cli = CliArgs {
            host: Some("192.168.1.1".to_string()),
            port: Some(9000),
            log_level: Some("debug".to_string()),
            spot_csv: Some(PathBuf::from("spot.csv")),
            ..Default::default()
        };

        config.merge_with_cli(&cli);

        assert_eq!(config.host, "192.168.1.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.data.spot_csv, PathBuf::from("spot.csv"));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
            host = "127.0.0.1"
            port = 3000
            log_level = "debug"
            environment = "production"

            [data]
            spot_csv = "/data/nifty_spot.csv"

            [cache]
            result_ttl_secs = 120

            [analytics]
            default_rate = 0.065
            default_time_filter = ["09:15", "15:15"]
        "#;

        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.data.spot_csv, PathBuf::from("/data/nifty_spot.csv"));
        assert_eq!(config.data.options_dir, PathBuf::from("data/options"));
        assert_eq!(config.cache.series_ttl_secs, 86_400);
        assert_eq!(config.cache.result_ttl_secs, 120);
        assert_eq!(config.analytics.default_rate, 0.065);
        assert_eq!(config.analytics.asof_tolerance_secs, 60);
        assert_eq!(config.analytics.default_time_filter, ["09:15", "15:15"]);
    }

    #[test]
    fn test_partial_toml_deserialization() {
        let config: ServerConfig = toml::from_str("port = 9000").unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_toml_rejects_bad_log_level() {
        assert!(toml::from_str::<ServerConfig>(r#"log_level = "loud""#).is_err());
    }

    #[test]
    fn test_pipeline_config() {
        let mut config = ServerConfig::default();
        config.cache.series_ttl_secs = 10;
        config.analytics.asof_tolerance_secs = 30;
        config.analytics.default_time_filter = vec![" 09:15 ".into(), "".into()];

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.series_ttl, Duration::from_secs(10));
        assert_eq!(pipeline.result_ttl, Duration::from_secs(3_600));
        assert_eq!(pipeline.asof_tolerance.num_seconds(), 30);
        assert_eq!(pipeline.default_time_filter, ["09:15"]);
    }

    #[test]
    fn test_priority_cli_over_env_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 3000\nhost = \"10.0.0.1\"\nlog_level = \"warn\"").unwrap();

        let cli = CliArgs {
            config_file: Some(file.path().to_path_buf()),
            port: Some(4000),
            ..Default::default()
        };
        let config = build_config_with_env(
            &cli,
            env_from(&[(env::PORT, "3500"), (env::LOG_LEVEL, "error")]),
        )
        .unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.host, "10.0.0.1");
    }

    #[test]
    fn test_build_config_with_defaults() {
        let config = build_config_with_env(&CliArgs::default(), no_env).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_missing_config_file() {
        let cli = CliArgs {
            config_file: Some(PathBuf::from("/no/such/greeks.toml")),
            ..Default::default()
        };
        assert!(matches!(
            build_config_with_env(&cli, no_env),
            Err(ConfigError::FileError(_))
        ));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidPort(0);
        assert!(err.to_string().contains("Invalid port"));

        let err = ConfigError::InvalidLogLevel("bad".to_string());
        assert!(err.to_string().contains("Invalid log level"));

        let err = ConfigError::ZeroDuration {
            name: "cache.series_ttl_secs",
        };
        assert!(err.to_string().contains("cache.series_ttl_secs"));
    }
}
