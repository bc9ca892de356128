#![deny(warnings, rust_2024_compatibility)]
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
#![allow(
    clippy::cast_possible_truncation, // Timestamps and nanosecond fractions stay in range
    clippy::cast_precision_loss,      // Epoch microseconds fit an f64 mantissa
    clippy::missing_errors_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. ClientError in client module
    clippy::must_use_candidate
)]

pub mod app;
pub mod client;
pub mod domain;
pub mod forwarder;

pub use client::{ClientError, ErrorTrackingClient, TrackerComponent};
pub use domain::{EventPayload, ForwarderError, Level, LogRecord, Payload, StackTrace};
pub use forwarder::{ContextProvider, ForwarderConfig, LogForwarder};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
