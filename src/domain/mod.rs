//! Domain layer for sentry-log-target.
//!
//! Contains the canonical types shared across all modules:
//! - `LogRecord`: A buffered host log message (payload, level, category, time, trace)
//! - `EventPayload`: The event shape handed to the error-tracking client
//! - `Level` / `EventLevel`: Host and service severities, bridged by `map_level`
//! - `ForwarderError`: Top-level error type

pub mod error;
pub mod event;
pub mod level;
pub mod record;

pub use error::ForwarderError;
pub use event::EventPayload;
pub use level::{EventLevel, Level, map_level};
pub use record::{BoxError, LogRecord, Payload, RecordedError, StackFrame, StackTrace};
