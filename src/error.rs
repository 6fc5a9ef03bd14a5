use std::sync::Arc;

use thiserror::Error;

/// Result type returned by every fallible operation of this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`DecisionClient`](crate::DecisionClient) and decision engines.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The requested feature key is not registered with the engine.
    #[error("Feature with key {0} not found")]
    FeatureNotFound(String),

    /// An error raised by the underlying decision engine. Passed through unchanged.
    #[error(transparent)]
    Upstream(#[from] EngineError),
}

/// Failures that originate inside a decision engine.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum EngineError {
    /// The datafile is not a valid JSON configuration document.
    #[error("invalid datafile")]
    InvalidDatafile(#[source] Arc<serde_json::Error>),

    /// A single feature entry of the datafile could not be parsed.
    #[error("error parsing configuration of feature {0}")]
    ConfigurationParseError(String),

    /// The engine refused or failed to accept a tracking event.
    #[error("failed to dispatch tracking event: {0}")]
    Dispatch(String),

    // std::io::Error is not clonable, so we're wrapping it in an Arc.
    /// An I/O error while reading the datafile.
    #[error(transparent)]
    Io(Arc<std::io::Error>),

    /// The poller thread panicked. This should normally never happen.
    #[error("poller thread panicked")]
    PollerThreadPanicked,
}

impl From<std::io::Error> for EngineError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidDatafile(Arc::new(value))
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Upstream(value.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Upstream(value.into())
    }
}
