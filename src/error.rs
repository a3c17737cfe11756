//! Error types shared by the upstream client and its callers.

use thiserror::Error;
use tracing::warn;

/// Failure talking to the upstream impact service.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {endpoint} failed: {message}")]
    Network { endpoint: String, message: String },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("could not decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("invalid upstream url {endpoint}: {message}")]
    InvalidUrl { endpoint: String, message: String },
}

impl ClientError {
    pub fn endpoint(&self) -> &str {
        match self {
            ClientError::Network { endpoint, .. }
            | ClientError::Status { endpoint, .. }
            | ClientError::Decode { endpoint, .. }
            | ClientError::InvalidUrl { endpoint, .. } => endpoint,
        }
    }
}

/// Outcome of an upstream fetch as seen by the presentation layer.
///
/// `Empty` and `Failed` are deliberately distinct: an asset with no dependents
/// is a valid answer, an unreachable upstream is not.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Data(T),
    Empty,
    Failed(String),
}

impl<T> Fetched<T> {
    /// Classify a fetch result, using `is_empty` to detect a zero-record answer.
    pub fn from_result<E: std::fmt::Display>(
        result: Result<T, E>,
        is_empty: impl FnOnce(&T) -> bool,
    ) -> Self {
        match result {
            Ok(value) if is_empty(&value) => Fetched::Empty,
            Ok(value) => Fetched::Data(value),
            Err(e) => {
                warn!(error = %e, "upstream fetch failed");
                Fetched::Failed(e.to_string())
            }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Data(v) => Fetched::Data(f(v)),
            Fetched::Empty => Fetched::Empty,
            Fetched::Failed(msg) => Fetched::Failed(msg),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Fetched::Data(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Fetched::Failed(_))
    }
}
