//! Web API module for Precinct
//!
//! REST endpoints for:
//! - Unit catalog and per-unit rosters
//! - Officer lookup
//! - Unit membership / rank management
//! - Health probe

pub mod docs;
pub mod health;
pub mod units;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

pub use docs::docs_routes;
pub use health::health_routes;
pub use units::units_routes;

/// Standard response envelope
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None, code: None }
    }
}

/// Core error carried to an HTTP response
///
/// Maps the management taxonomy onto status classes: 400 invalid request,
/// 403 forbidden (with the denial reason in the body), 404 not found,
/// 409 version conflict, 500 store failure.
pub struct ApiError(precinct_core::Error);

impl From<precinct_core::Error> for ApiError {
    fn from(err: precinct_core::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use precinct_core::Error;

        let status = match &self.0 {
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::Conflict => StatusCode::CONFLICT,
            Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.0.to_string()),
            code: Some(self.0.code()),
        };
        (status, Json(body)).into_response()
    }
}

/// Create the API router with all endpoints
pub fn api_router() -> Router {
    Router::new().merge(units_routes()).merge(docs_routes())
}
