pub mod json_lines;
#[cfg(feature = "sentry")]
pub mod sentry_sdk;

use crate::domain::{EventPayload, ForwarderError, StackTrace};
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

pub use json_lines::JsonLinesClient;
#[cfg(feature = "sentry")]
pub use sentry_sdk::{SentryClient, SentryOptions};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Event rejected: {0}")]
    Rejected(String),
}

/// Capabilities the forwarder needs from an error-tracking SDK.
///
/// Delivery, retries and serialization belong to the implementation; the
/// forwarder only looks at whether the call returned an error.
#[cfg_attr(test, automock)]
#[cfg_attr(test, allow(unused_parens))]
pub trait ErrorTrackingClient: Send + Sync {
    /// Reports an exception. The client extracts message and stack itself.
    fn capture_exception(&self, error: &(dyn StdError + Send + Sync + 'static))
    -> Result<(), ClientError>;

    /// Reports a message event with an optional host-captured stack.
    fn capture<'a>(&self, event: EventPayload, trace: Option<&'a StackTrace>)
    -> Result<(), ClientError>;

    /// Blocks until queued events are handed off. No-op by default.
    fn flush(&self) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Shared error-tracking component: the enabled switch plus the client handle.
///
/// Built once at startup and passed to every forwarder that needs it.
#[derive(Clone)]
pub struct TrackerComponent {
    enabled: bool,
    client: Option<Arc<dyn ErrorTrackingClient>>,
}

impl TrackerComponent {
    pub fn new(client: Arc<dyn ErrorTrackingClient>) -> Self {
        Self {
            enabled: true,
            client: Some(client),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            client: None,
        }
    }

    pub fn from_parts(enabled: bool, client: Option<Arc<dyn ErrorTrackingClient>>) -> Self {
        Self { enabled, client }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn get_client(&self) -> Result<Arc<dyn ErrorTrackingClient>, ForwarderError> {
        self.client.clone().ok_or_else(|| {
            ForwarderError::Configuration(
                "error-tracking component is enabled but has no client".to_string(),
            )
        })
    }
}

impl std::fmt::Debug for TrackerComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerComponent")
            .field("enabled", &self.enabled)
            .field("client", &self.client.as_ref().map(|_| "<client>"))
            .finish()
    }
}
