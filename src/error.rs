//! Unified error types for the odds desk.

use thiserror::Error;

use crate::parlay::PickId;

/// Unified error type for the odds desk.
#[derive(Error, Debug)]
pub enum DeskError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Upstream API error.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Selection command error.
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors talking to the picks/odds backend.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request reached the server but did not succeed.
    #[error("request to {endpoint} failed: {reason}")]
    RequestFailed {
        /// Endpoint path that failed.
        endpoint: String,
        /// Reason for failure.
        reason: String,
    },

    /// Response body could not be decoded.
    #[error("failed to parse response from {endpoint}: {reason}")]
    ParseError {
        /// Endpoint path.
        endpoint: String,
        /// Decoder message.
        reason: String,
    },

    /// HTTP transport failure.
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Errors raised by selection commands.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    /// The pick id is not present in the current pick set.
    #[error("pick {0} is not in the current pick set")]
    UnknownPick(PickId),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, DeskError>;
