use crate::client::ClientError;
use thiserror::Error;

/// Top-level error type for the forwarder.
#[derive(Error, Debug)]
pub enum ForwarderError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transmission error at record {index}: {source}")]
    Transmission {
        index: usize,
        #[source]
        source: ClientError,
    },
}

impl ForwarderError {
    /// Position in the batch of the record whose delivery failed.
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            ForwarderError::Transmission { index, .. } => Some(*index),
            ForwarderError::Configuration(_) => None,
        }
    }
}
