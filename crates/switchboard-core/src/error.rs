//! Unified error types for Switchboard.
//!
//! Nothing in this module ever stores the bot token. Transport errors carry the
//! *redacted* request URL and a reason string that has already been scrubbed
//! by the transport layer.
//!
//! A handler that does not match an update is not an error: match rules
//! resolve to `false`. Unregistering an unknown handler id is a no-op.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur while issuing a single HTTP request to the platform.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The HTTP client failed to complete the request.
    #[error("error do request for method {method} ({url}): {reason}")]
    Request {
        /// The API method being called.
        method: String,
        /// The request URL with the token redacted.
        url: String,
        /// Sanitized failure reason.
        reason: String,
    },

    /// The caller cancelled the request before it completed.
    #[error("request for method {method} was cancelled")]
    Cancelled {
        /// The API method being called.
        method: String,
    },

    /// The platform answered with a server-side HTTP error.
    #[error("error response from platform for method {method}: HTTP {status}")]
    Status {
        /// The API method being called.
        method: String,
        /// HTTP status code.
        status: u16,
    },

    /// The request parameters could not be encoded.
    #[error("failed to encode request params: {0}")]
    Encode(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl TransportError {
    /// Returns `true` if this error is the result of caller cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for platform API calls.
///
/// The status-like variants mirror the `error_code` values the platform
/// returns in its response envelope.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// 400 Bad Request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// 401 Unauthorized.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// 403 Forbidden.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// 404 Not Found.
    #[error("not found: {0}")]
    NotFound(String),

    /// 409 Conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// 429 Too Many Requests. Retrying is left to the caller.
    #[error("too many requests, retry after {retry_after}s: {description}")]
    TooManyRequests {
        /// Seconds the platform asked to wait.
        retry_after: u64,
        /// Platform description.
        description: String,
    },

    /// The group was migrated to a supergroup with a new chat id.
    #[error("chat migrated to {migrate_to_chat_id}: {description}")]
    Migrate {
        /// The new chat id.
        migrate_to_chat_id: i64,
        /// Platform description.
        description: String,
    },

    /// Any other platform error.
    #[error("API error ({code}): {description}")]
    Other {
        /// Platform `error_code`.
        code: i64,
        /// Platform description.
        description: String,
    },
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;
