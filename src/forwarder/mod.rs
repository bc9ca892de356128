pub mod context;

use crate::client::{ClientError, ErrorTrackingClient, TrackerComponent};
use crate::domain::{EventPayload, ForwarderError, LogRecord, Payload, map_level};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub use context::{ContextProvider, EmptyContext, VarsContext};

/// Settings fixed when the forwarder is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwarderConfig {
    /// Attach the context hook's output as `extra["context"]`.
    pub include_context: bool,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            include_context: true,
        }
    }
}

/// Log target that turns flushed records into error-tracking events.
///
/// The client is resolved once in [`LogForwarder::new`]. A forwarder built
/// from a disabled component never holds a client and exports nothing.
pub struct LogForwarder {
    client: Option<Arc<dyn ErrorTrackingClient>>,
    config: ForwarderConfig,
    context: Box<dyn ContextProvider>,
}

impl LogForwarder {
    pub fn new(component: &TrackerComponent, config: ForwarderConfig) -> Result<Self, ForwarderError> {
        let client = if component.enabled() {
            Some(component.get_client()?)
        } else {
            debug!("Error tracking disabled, forwarder will drop all exports");
            None
        };

        Ok(Self {
            client,
            config,
            context: Box::new(EmptyContext),
        })
    }

    pub fn with_context_provider(mut self, provider: Box<dyn ContextProvider>) -> Self {
        self.context = provider;
        self
    }

    pub fn enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn config(&self) -> ForwarderConfig {
        self.config
    }

    /// Sends one event per record, in order, and returns how many were sent.
    ///
    /// Exception payloads additionally go through the client's exception
    /// capture. The first client failure stops the batch; records after it are
    /// not sent.
    pub fn export(&self, records: Vec<LogRecord>) -> Result<usize, ForwarderError> {
        let Some(client) = &self.client else {
            return Ok(0);
        };

        let total = records.len();
        debug!("Exporting {} log records", total);

        for (index, record) in records.into_iter().enumerate() {
            if let Err(source) = self.export_one(client.as_ref(), &record) {
                warn!(
                    "Export aborted at record {} of {} (category {}): {}",
                    index + 1,
                    total,
                    record.category,
                    source
                );
                return Err(ForwarderError::Transmission { index, source });
            }
        }

        Ok(total)
    }

    fn export_one(
        &self,
        client: &dyn ErrorTrackingClient,
        record: &LogRecord,
    ) -> Result<(), ClientError> {
        if let Payload::Error(error) = &record.payload {
            client.capture_exception(&**error)?;
        }

        let event = self.build_event(record);
        client.capture(event, record.trace.as_ref())
    }

    /// Maps a record to the event that [`export`](Self::export) would send.
    pub fn build_event(&self, record: &LogRecord) -> EventPayload {
        let (message, mut extra) = describe(&record.payload);

        if self.config.include_context {
            extra.insert(
                "context".to_string(),
                Value::String(self.context.context_message()),
            );
        }

        EventPayload {
            level: map_level(record.level),
            timestamp: record.timestamp,
            message,
            extra,
            tags: BTreeMap::from([("category".to_string(), record.category.clone())]),
        }
    }
}

/// Splits a payload into the event message and its extra data.
fn describe(payload: &Payload) -> (String, Map<String, Value>) {
    match payload {
        Payload::Error(error) => (error.to_string(), Map::new()),
        Payload::Structured(map) => match map.get("msg") {
            Some(msg) if !msg.is_null() => {
                let mut extra = map.clone();
                extra.remove("msg");
                (value_to_text(msg), extra)
            }
            _ => (Value::Object(map.clone()).to_string(), Map::new()),
        },
        Payload::Plain(text) => (text.clone(), Map::new()),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockErrorTrackingClient;
    use crate::domain::{EventLevel, Level, RecordedError};
    use mockall::Sequence;
    use serde_json::json;

    fn forwarder(include_context: bool) -> LogForwarder {
        LogForwarder {
            client: None,
            config: ForwarderConfig { include_context },
            context: Box::new(EmptyContext),
        }
    }

    #[test]
    fn test_describe_structured_with_msg() {
        let Value::Object(map) = json!({"msg": "timeout", "retries": 3}) else {
            unreachable!()
        };
        let (message, extra) = describe(&Payload::Structured(map));
        assert_eq!(message, "timeout");
        assert_eq!(Value::Object(extra), json!({"retries": 3}));
    }

    #[test]
    fn test_describe_structured_without_msg() {
        let Value::Object(map) = json!({"user": 7}) else {
            unreachable!()
        };
        let (message, extra) = describe(&Payload::Structured(map));
        assert_eq!(message, r#"{"user":7}"#);
        assert!(extra.is_empty());
    }

    #[test]
    fn test_describe_null_msg_is_treated_as_absent() {
        let Value::Object(map) = json!({"msg": null, "user": 7}) else {
            unreachable!()
        };
        let (message, extra) = describe(&Payload::Structured(map));
        assert_eq!(message, r#"{"msg":null,"user":7}"#);
        assert!(extra.is_empty());
    }

    #[test]
    fn test_describe_non_string_msg() {
        let Value::Object(map) = json!({"msg": 404}) else {
            unreachable!()
        };
        let (message, extra) = describe(&Payload::Structured(map));
        assert_eq!(message, "404");
        assert!(extra.is_empty());
    }

    #[test]
    fn test_build_event_without_context() {
        let record = LogRecord::new("disk full", Level::Warning, "io", 1000.0);
        let event = forwarder(false).build_event(&record);

        assert_eq!(event.level, EventLevel::Warning);
        assert_eq!(event.timestamp, 1000.0);
        assert_eq!(event.message, "disk full");
        assert!(event.extra.is_empty());
        assert_eq!(event.category(), Some("io"));
    }

    #[test]
    fn test_build_event_default_context_is_empty_string() {
        let record = LogRecord::new("hello", Level::Info, "app", 1.0);
        let event = forwarder(true).build_event(&record);
        assert_eq!(event.extra.get("context"), Some(&json!("")));
    }

    #[test]
    fn test_disabled_forwarder_exports_nothing() {
        let forwarder = LogForwarder::new(&TrackerComponent::disabled(), ForwarderConfig::default())
            .unwrap();
        assert!(!forwarder.enabled());
        let records = vec![LogRecord::new("x", Level::Error, "app", 0.0)];
        assert_eq!(forwarder.export(records).unwrap(), 0);
    }

    #[test]
    fn test_exception_capture_precedes_event() {
        let mut seq = Sequence::new();
        let mut client = MockErrorTrackingClient::new();
        client
            .expect_capture_exception()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|error| {
                assert_eq!(error.to_string(), "boom");
                Ok(())
            });
        client
            .expect_capture()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|event, trace| {
                assert_eq!(event.message, "boom");
                assert!(trace.is_none());
                Ok(())
            });

        let component = TrackerComponent::new(Arc::new(client));
        let forwarder = LogForwarder::new(&component, ForwarderConfig { include_context: false })
            .unwrap();
        let record = LogRecord::new(
            Payload::error(RecordedError::new("RuntimeException", "boom")),
            Level::Error,
            "app",
            0.0,
        );

        assert_eq!(forwarder.export(vec![record]).unwrap(), 1);
    }
}
