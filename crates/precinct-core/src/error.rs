//! Error types for precinct-core
//!
//! The management taxonomy from the endpoint's point of view: each variant
//! maps to one HTTP status class at the API layer. "Requested state already
//! holds" is not an error; the manager reports it as a successful outcome
//! with `changed = false`.

use thiserror::Error;

use crate::permissions::DenyReason;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// No or invalid credential (401)
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated but not authorized for this action (403)
    #[error("forbidden: {0}")]
    Forbidden(DenyReason),

    /// Unit or officer does not exist (404)
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed request, rejected before any authorization check (400)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Record changed under us; the caller should re-read and resubmit (409)
    #[error("officer record was modified concurrently")]
    Conflict,

    /// Officer store failure (500)
    #[error("store error: {0}")]
    Store(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable code for API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden(reason) => reason.code(),
            Self::NotFound(_) => "not_found",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Conflict => "conflict",
            Self::Store(_) => "store_error",
        }
    }
}
