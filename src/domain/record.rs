use super::level::Level;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::fmt;

/// Boxed error carried by an exception record.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// What the application handed to the logger.
///
/// Resolved once when the record enters the crate; the forwarder only matches
/// on the variant.
#[derive(Debug)]
pub enum Payload {
    /// An exception object. Routed through the client's exception capture.
    Error(BoxError),
    /// A key/value message. The `"msg"` key, if present, is the description.
    Structured(Map<String, Value>),
    /// Anything else, already rendered as text.
    Plain(String),
}

impl Payload {
    pub fn error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Payload::Error(Box::new(error))
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Payload::Plain(text.into())
    }

    /// Classifies a JSON value coming off the wire.
    ///
    /// `{"exception": {"class": .., "message": ..}}` is an error; other objects
    /// are structured; strings stay as they are and every other value is kept
    /// as its JSON text.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                if let Some(Value::Object(exception)) = map.get("exception") {
                    return Payload::Error(Box::new(RecordedError::from_object(exception)));
                }
                Payload::Structured(map)
            }
            Value::String(text) => Payload::Plain(text),
            other => Payload::Plain(other.to_string()),
        }
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Payload::Structured(map)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Plain(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Plain(text.to_string())
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Payload::from_value)
    }
}

/// An exception that was serialized by the host before reaching this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedError {
    pub class: String,
    pub message: String,
}

impl RecordedError {
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
        }
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        let text = |key: &str| match object.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let class = text("class");
        Self {
            class: if class.is_empty() {
                "Exception".to_string()
            } else {
                class
            },
            message: text("message"),
        }
    }
}

impl fmt::Display for RecordedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for RecordedError {}

/// One frame of a host-captured call stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
}

/// Call stack attached by the host, innermost frame first. Opaque to the
/// forwarder; handed to the client untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackTrace {
    pub frames: Vec<StackFrame>,
}

impl StackTrace {
    pub fn new(frames: Vec<StackFrame>) -> Self {
        Self { frames }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// A buffered log message, consumed exactly once by an export.
#[derive(Debug, Deserialize)]
pub struct LogRecord {
    pub payload: Payload,
    pub level: Level,
    pub category: String,
    /// Seconds since the Unix epoch, with sub-second precision.
    pub timestamp: f64,
    #[serde(default, alias = "traces")]
    pub trace: Option<StackTrace>,
}

impl LogRecord {
    pub fn new(
        payload: impl Into<Payload>,
        level: Level,
        category: impl Into<String>,
        timestamp: f64,
    ) -> Self {
        Self {
            payload: payload.into(),
            level,
            category: category.into(),
            timestamp,
            trace: None,
        }
    }

    /// Record stamped with the current wall clock.
    pub fn now(payload: impl Into<Payload>, level: Level, category: impl Into<String>) -> Self {
        let timestamp = chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        Self::new(payload, level, category, timestamp)
    }

    pub fn with_trace(mut self, trace: StackTrace) -> Self {
        self.trace = Some(trace);
        self
    }
}
