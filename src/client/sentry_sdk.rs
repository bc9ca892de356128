use super::{ClientError, ErrorTrackingClient};
use crate::domain::{EventLevel, EventPayload, RecordedError, StackTrace};
use ::sentry::protocol::{Event, Frame, Stacktrace};
use std::borrow::Cow;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
pub struct SentryOptions {
    pub dsn: String,
    pub environment: Option<String>,
    pub release: Option<String>,
    pub server_name: Option<String>,
    pub flush_timeout: Duration,
}

impl SentryOptions {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            environment: None,
            release: None,
            server_name: None,
            flush_timeout: Duration::from_secs(2),
        }
    }
}

/// Client backed by the official Sentry SDK. Transport, rate limiting and
/// retries are the SDK's.
pub struct SentryClient {
    client: Arc<::sentry::Client>,
    flush_timeout: Duration,
}

impl SentryClient {
    pub fn new(options: SentryOptions) -> Result<Self, ClientError> {
        let dsn: ::sentry::types::Dsn = options
            .dsn
            .parse()
            .map_err(|e| ClientError::Transport(format!("Invalid DSN '{}': {}", options.dsn, e)))?;

        let client = ::sentry::Client::from_config(::sentry::ClientOptions {
            dsn: Some(dsn),
            environment: options.environment.map(Cow::Owned),
            release: options.release.map(Cow::Owned),
            server_name: options.server_name.map(Cow::Owned),
            ..Default::default()
        });

        if !client.is_enabled() {
            return Err(ClientError::Transport(
                "Sentry client could not be enabled".to_string(),
            ));
        }

        Ok(Self {
            client: Arc::new(client),
            flush_timeout: options.flush_timeout,
        })
    }
}

impl ErrorTrackingClient for SentryClient {
    fn capture_exception(
        &self,
        error: &(dyn StdError + Send + Sync + 'static),
    ) -> Result<(), ClientError> {
        let id = self.client.capture_event(exception_event(error), None);
        tracing::debug!("Captured exception as Sentry event {}", id);
        Ok(())
    }

    fn capture(&self, event: EventPayload, trace: Option<&StackTrace>) -> Result<(), ClientError> {
        let id = self.client.capture_event(to_sentry_event(event, trace), None);
        tracing::debug!("Captured message as Sentry event {}", id);
        Ok(())
    }

    fn flush(&self) -> Result<(), ClientError> {
        if self.client.flush(Some(self.flush_timeout)) {
            Ok(())
        } else {
            Err(ClientError::Transport(format!(
                "Sentry flush did not finish within {:?}",
                self.flush_timeout
            )))
        }
    }
}

/// Exception event whose type is the host class when the error was recorded
/// by the host, and the Rust type name otherwise.
fn exception_event(error: &(dyn StdError + Send + Sync + 'static)) -> Event<'static> {
    let mut event = ::sentry::event_from_error(error);

    // The outermost error is the last entry
    if let Some(recorded) = error.downcast_ref::<RecordedError>()
        && let Some(exception) = event.exception.values.last_mut()
    {
        exception.ty = recorded.class.clone();
    }

    event
}

fn to_sentry_level(level: EventLevel) -> ::sentry::Level {
    match level {
        EventLevel::Error => ::sentry::Level::Error,
        EventLevel::Warning => ::sentry::Level::Warning,
        EventLevel::Info => ::sentry::Level::Info,
        EventLevel::Debug => ::sentry::Level::Debug,
    }
}

/// Sentry lists frames outermost first; host traces are innermost first.
fn to_sentry_stacktrace(trace: &StackTrace) -> Stacktrace {
    let frames = trace
        .frames
        .iter()
        .rev()
        .map(|frame| Frame {
            function: frame.function.clone(),
            module: frame.class.clone(),
            filename: frame.file.clone(),
            lineno: frame.line.map(u64::from),
            ..Default::default()
        })
        .collect();

    Stacktrace {
        frames,
        ..Default::default()
    }
}

fn to_sentry_event(event: EventPayload, trace: Option<&StackTrace>) -> Event<'static> {
    let timestamp = event
        .datetime()
        .map(SystemTime::from)
        .unwrap_or_else(SystemTime::now);

    Event {
        level: to_sentry_level(event.level),
        message: Some(event.message),
        timestamp,
        extra: event.extra.into_iter().collect(),
        tags: event.tags.into_iter().collect(),
        stacktrace: trace.filter(|t| !t.is_empty()).map(to_sentry_stacktrace),
        ..Default::default()
    }
}
