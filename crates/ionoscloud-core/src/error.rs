//! Error types for IONOS Cloud API operations.
//!
//! One error enum covers the whole call path: missing configuration,
//! socket-level transport failures, malformed responses, provider error
//! envelopes and local schema validation.

use serde::Deserialize;
use thiserror::Error;

/// Status code attached to failures that carry no provider `httpStatus`.
///
/// Matches the generic connection-error code used by provider error
/// translation when the envelope does not name one.
pub const GENERIC_ERROR_CODE: u16 = 2;

/// Main error type for IONOS Cloud operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No usable credential (neither username/password nor token) is
    /// configured; the caller must send the operator to configuration.
    #[error("no usable credentials configured")]
    ConfigurationRequired,

    /// Socket connect or write failed. Not retried at this layer.
    #[error("transport error: {0}")]
    Transport(String),

    /// Connect or overall request deadline expired.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Response body missing the expected envelope shape, broken chunk
    /// framing, or non-JSON where JSON was expected.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A lookup exhausted the collection without a match, or an operation
    /// required an id the entity does not have.
    #[error("not found: {0}")]
    NotFound(String),

    /// Non-2xx status or provider error envelope, translated into a single
    /// message carrying the provider's HTTP status.
    #[error("{message}")]
    Api {
        /// Provider `httpStatus`, or [`GENERIC_ERROR_CODE`] when absent.
        status: u16,
        /// Concatenated `message (errorCode)` list from the envelope.
        message: String,
    },

    /// Caller-supplied attributes reference an unknown field or a value of
    /// the wrong type. Raised before any network call.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// Bad endpoint URL, unreadable credential store or other local
    /// configuration problem.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Specialized result type for IONOS Cloud operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns a stable code for programmatic handling.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigurationRequired => "CONFIGURATION_REQUIRED",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::MalformedResponse(_) => "MALFORMED_RESPONSE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Api { .. } => "API_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Returns the HTTP status carried by the failure, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Config(err.to_string())
    }
}

/// Provider error envelope: `{"httpStatus":N,"messages":[...]}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    /// HTTP status the provider attached to the failure.
    #[serde(rename = "httpStatus")]
    pub http_status: Option<u16>,
    /// Individual error messages.
    #[serde(default)]
    pub messages: Vec<ErrorMessage>,
}

/// One entry of a provider error envelope.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ErrorMessage {
    /// Provider-specific error code.
    #[serde(rename = "errorCode", default)]
    pub error_code: String,
    /// Human-readable message text.
    #[serde(default)]
    pub message: String,
}

impl ErrorEnvelope {
    /// Concatenates all messages into one `message (errorCode), ...` string.
    #[must_use]
    pub fn describe(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{} ({})", m.message, m.error_code))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Translates the envelope into an [`Error::Api`] for the given URL.
    #[must_use]
    pub fn into_error(self, url: &str) -> Error {
        Error::Api {
            status: self.http_status.unwrap_or(GENERIC_ERROR_CODE),
            message: format!("request to '{url}' failed: {}", self.describe()),
        }
    }
}
