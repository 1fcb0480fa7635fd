//! Oracle error types with HTTP status code mapping.
//!
//! [`OracleError`] is the central error type for the oracle. Most variants
//! never reach a client: the aggregation cycle absorbs transient I/O and
//! malformed-record errors at the sub-fetch boundary. The read API maps the
//! remaining ones to a structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "token not found: wrap.near"
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`OracleError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Oracle-wide error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status               |
/// |-----------|-------------------|---------------------------|
/// | 1000–1999 | Data / arithmetic | 422 Unprocessable Entity  |
/// | 2000–2999 | Not Found         | 404 Not Found             |
/// | 3000–3999 | Server            | 500 Internal Server Error |
/// | 5000–5999 | Upstream          | 502 Bad Gateway           |
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// A decimal string could not be parsed.
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),

    /// A price derivation divided by a zero token amount.
    #[error("division by zero token amount")]
    DivisionByZero,

    /// A pool snapshot has no reserve entry for one of its tokens.
    #[error("pool {pool_id} has no supply for token {token}")]
    MissingSupply {
        /// Pool whose supplies are incomplete.
        pool_id: u64,
        /// Token with no reserve entry.
        token: String,
    },

    /// A pool snapshot is not a two-token pool.
    #[error("pool {0} is not a two-token pool")]
    MalformedPool(u64),

    /// Token with the given address is not in the store.
    #[error("token not found: {0}")]
    TokenNotFound(String),

    /// The chain JSON-RPC endpoint returned an error object.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// Transport-level HTTP failure (connect, timeout, status).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// An upstream payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OracleError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidAmount(_) => 1001,
            Self::DivisionByZero => 1002,
            Self::MissingSupply { .. } => 1003,
            Self::MalformedPool(_) => 1004,
            Self::TokenNotFound(_) => 2001,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::Config(_) => 3002,
            Self::Rpc(_) => 5001,
            Self::Http(_) => 5002,
            Self::Decode(_) => 5003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidAmount(_)
            | Self::DivisionByZero
            | Self::MissingSupply { .. }
            | Self::MalformedPool(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::TokenNotFound(_) => StatusCode::NOT_FOUND,
            Self::Persistence(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Rpc(_) | Self::Http(_) | Self::Decode(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<sqlx::Error> for OracleError {
    fn from(e: sqlx::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl IntoResponse for OracleError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
