use clap::{ArgAction, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Verbosity of this process's own diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// NDJSON file of log records (stdin when omitted)
    #[arg(long, env = "INPUT_FILE")]
    pub input: Option<PathBuf>,

    /// Write events as NDJSON here instead of sending them (stdout when omitted and no DSN)
    #[arg(long, env = "OUTPUT_FILE")]
    pub output: Option<PathBuf>,

    /// Sentry DSN; requires the `sentry` feature
    #[arg(long, env = "SENTRY_DSN")]
    pub dsn: Option<String>,

    /// Environment reported with every event
    #[arg(long, env = "SENTRY_ENVIRONMENT")]
    pub environment: Option<String>,

    /// Release reported with every event
    #[arg(long, env = "SENTRY_RELEASE")]
    pub release: Option<String>,

    /// Forward records at all
    #[arg(long, env = "SENTRY_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub enabled: bool,

    /// Attach process context to every event
    #[arg(long, env = "INCLUDE_CONTEXT", default_value_t = true, action = ArgAction::Set)]
    pub context: bool,

    /// Records handed to the forwarder per flush
    #[arg(long, env = "BATCH_SIZE", default_value = "1000")]
    pub batch_size: usize,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Extra `target=level` filters for this process's diagnostics
    #[arg(long = "log-directive", env = "LOG_DIRECTIVES", value_delimiter = ',')]
    pub log_directives: Vec<String>,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            dsn: None,
            environment: None,
            release: None,
            enabled: true,
            context: true,
            batch_size: 1000,
            log_level: LogLevel::Info,
            log_directives: Vec::new(),
            config_file: None,
        }
    }
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::try_parse_from(args)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;

        // A config file replaces the command line entirely
        let config = match &config.config_file {
            Some(path) => Self::from_file(path)?,
            None => config,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        if let Some(dsn) = &self.dsn {
            validate_dsn(dsn)?;

            if !cfg!(feature = "sentry") {
                return Err(ConfigError::InvalidConfig(
                    "A DSN was given but this build has no Sentry support (enable the `sentry` feature)"
                        .to_string(),
                ));
            }

            if self.output.is_some() {
                return Err(ConfigError::InvalidConfig(
                    "--dsn and --output are mutually exclusive".to_string(),
                ));
            }
        }

        if let Some(input) = &self.input
            && !input.exists()
        {
            return Err(ConfigError::InvalidConfig(format!(
                "Input file does not exist: {}",
                input.display()
            )));
        }

        Ok(())
    }
}

/// A DSN is `scheme://public_key@host/project_id`.
fn validate_dsn(dsn: &str) -> Result<(), ConfigError> {
    let url = Url::parse(dsn)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid DSN '{dsn}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "Invalid DSN '{dsn}': scheme must be http or https"
        )));
    }

    if url.username().is_empty() {
        return Err(ConfigError::InvalidUrl(format!(
            "Invalid DSN '{dsn}': missing public key"
        )));
    }

    if url.path().trim_matches('/').is_empty() {
        return Err(ConfigError::InvalidUrl(format!(
            "Invalid DSN '{dsn}': missing project id"
        )));
    }

    Ok(())
}
