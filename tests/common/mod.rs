#![allow(dead_code)]

use parking_lot::Mutex;
use sentry_log_target::client::{ClientError, ErrorTrackingClient};
use sentry_log_target::domain::{EventPayload, StackTrace};
use std::error::Error as StdError;

/// What the forwarder asked the client to do, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Exception(String),
    Capture(EventPayload, Option<StackTrace>),
}

// Hand-written client double that records every call
#[derive(Debug, Default)]
pub struct RecordingClient {
    calls: Mutex<Vec<Call>>,
    fail_on_capture: Option<usize>,
    fail_exceptions: bool,
    flushes: Mutex<usize>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the n-th `capture` call (0-based).
    pub fn failing_capture(mut self, n: usize) -> Self {
        self.fail_on_capture = Some(n);
        self
    }

    pub fn failing_exceptions(mut self) -> Self {
        self.fail_exceptions = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn events(&self) -> Vec<EventPayload> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Capture(event, _) => Some(event),
                Call::Exception(_) => None,
            })
            .collect()
    }

    pub fn flush_count(&self) -> usize {
        *self.flushes.lock()
    }
}

impl ErrorTrackingClient for RecordingClient {
    fn capture_exception(
        &self,
        error: &(dyn StdError + Send + Sync + 'static),
    ) -> Result<(), ClientError> {
        if self.fail_exceptions {
            return Err(ClientError::Transport("exception endpoint down".to_string()));
        }
        self.calls.lock().push(Call::Exception(error.to_string()));
        Ok(())
    }

    fn capture(&self, event: EventPayload, trace: Option<&StackTrace>) -> Result<(), ClientError> {
        let mut calls = self.calls.lock();
        let captured = calls
            .iter()
            .filter(|call| matches!(call, Call::Capture(..)))
            .count();
        if self.fail_on_capture == Some(captured) {
            return Err(ClientError::Rejected(format!("capture #{captured} refused")));
        }
        calls.push(Call::Capture(event, trace.cloned()));
        Ok(())
    }

    fn flush(&self) -> Result<(), ClientError> {
        *self.flushes.lock() += 1;
        Ok(())
    }
}
