use super::config::LogLevel;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid directive '{input}': expected 'target=level'")]
    InvalidDirective { input: String },
    #[error("Invalid log level '{input}' in directive")]
    InvalidLevel { input: String },
    #[error("Logging initialization failed: {details}")]
    InitFailed {
        details: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// `target=level` filter entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDirective {
    pub target: String,
    pub level: LogLevel,
}

impl LogDirective {
    pub fn new(target: impl Into<String>, level: LogLevel) -> Self {
        Self {
            target: target.into(),
            level,
        }
    }

    pub fn parse(directive: &str) -> Result<Self, LoggingError> {
        let Some((target, level)) = directive.split_once('=') else {
            return Err(LoggingError::InvalidDirective {
                input: directive.to_string(),
            });
        };

        let target = target.trim();
        if target.is_empty() {
            return Err(LoggingError::InvalidDirective {
                input: directive.to_string(),
            });
        }

        let level = match level.trim().to_ascii_lowercase().as_str() {
            "error" => LogLevel::Error,
            "warn" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => {
                return Err(LoggingError::InvalidLevel {
                    input: level.to_string(),
                });
            }
        };

        Ok(Self::new(target, level))
    }

    pub fn to_filter_string(&self) -> String {
        format!("{}={}", self.target, self.level.as_str())
    }
}

/// Collects filter directives and installs the global subscriber.
pub struct LoggingSystem {
    directives: Arc<RwLock<Vec<LogDirective>>>,
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self {
            directives: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn add_directive(&self, directive_str: &str) -> Result<(), LoggingError> {
        let directive = LogDirective::parse(directive_str)?;
        self.directives.write().push(directive);
        Ok(())
    }

    /// Quiets the SDK and its HTTP stack.
    pub fn add_default_directives(&self) {
        let mut directives = self.directives.write();
        for target in ["sentry", "reqwest", "hyper"] {
            directives.push(LogDirective::new(target, LogLevel::Warn));
        }
    }

    pub fn build_filter_string(&self, default_level: LogLevel) -> String {
        let directives = self.directives.read();

        let mut filter_parts = Vec::with_capacity(directives.len() + 1);
        filter_parts.push(default_level.as_str().to_string());
        filter_parts.extend(directives.iter().map(LogDirective::to_filter_string));

        filter_parts.join(",")
    }

    pub fn initialize_tracing(&self, default_level: LogLevel) -> Result<(), LoggingError> {
        let filter_string = self.build_filter_string(default_level);

        let env_filter =
            EnvFilter::try_new(&filter_string).map_err(|e| LoggingError::InitFailed {
                details: format!("Failed to create EnvFilter with '{filter_string}'"),
                source: Box::new(e),
            })?;

        // Events go to stderr; stdout may carry the dry-run NDJSON stream
        let subscriber = tracing_subscriber::registry().with(env_filter).with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .compact(),
        );

        tracing::subscriber::set_global_default(subscriber).map_err(|e| {
            LoggingError::InitFailed {
                details: "Failed to set global tracing subscriber".to_string(),
                source: Box::new(e),
            }
        })
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs the process-wide subscriber. Only the first call has an effect.
pub fn setup_logging(level: LogLevel, directives: &[String]) -> Result<(), LoggingError> {
    use std::sync::OnceLock;

    static INIT: OnceLock<Result<(), String>> = OnceLock::new();

    let logging_system = LoggingSystem::new();
    logging_system.add_default_directives();
    for directive in directives {
        logging_system.add_directive(directive)?;
    }

    let result = INIT.get_or_init(|| {
        logging_system
            .initialize_tracing(level)
            .map_err(|e| e.to_string())
    });

    result.clone().map_err(|details| LoggingError::InitFailed {
        details,
        source: Box::new(std::io::Error::other("Logging initialization error")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directive() {
        let directive = LogDirective::parse("hyper=warn").unwrap();
        assert_eq!(directive, LogDirective::new("hyper", LogLevel::Warn));

        let directive = LogDirective::parse(" sentry_log_target = DEBUG ").unwrap();
        assert_eq!(directive.to_filter_string(), "sentry_log_target=debug");
    }

    #[test]
    fn test_parse_invalid_directives() {
        assert!(matches!(
            LogDirective::parse("invalid"),
            Err(LoggingError::InvalidDirective { .. })
        ));
        assert!(matches!(
            LogDirective::parse("=info"),
            Err(LoggingError::InvalidDirective { .. })
        ));
        assert!(matches!(
            LogDirective::parse("hyper=loud"),
            Err(LoggingError::InvalidLevel { .. })
        ));
    }

    #[test]
    fn test_build_filter_string() {
        let logging_system = LoggingSystem::new();
        assert_eq!(logging_system.build_filter_string(LogLevel::Info), "info");

        logging_system.add_default_directives();
        logging_system.add_directive("sentry_log_target=trace").unwrap();
        assert!(logging_system.add_directive("broken").is_err());

        let filter = logging_system.build_filter_string(LogLevel::Debug);
        assert_eq!(
            filter,
            "debug,sentry=warn,reqwest=warn,hyper=warn,sentry_log_target=trace"
        );
    }

    #[test]
    fn test_setup_logging_is_idempotent() {
        let directives = vec!["sentry_log_target=debug".to_string()];
        let first = setup_logging(LogLevel::Info, &directives);
        let second = setup_logging(LogLevel::Debug, &[]);
        assert_eq!(first.is_ok(), second.is_ok());
    }

    #[test]
    fn test_setup_logging_rejects_bad_directive() {
        let directives = vec!["no-level-here".to_string()];
        assert!(matches!(
            setup_logging(LogLevel::Info, &directives),
            Err(LoggingError::InvalidDirective { .. })
        ));
    }
}
