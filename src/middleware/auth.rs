//! Authentication middleware for Axum
//!
//! Extracts Bearer tokens or API keys from requests and validates them
//! against the AuthStore. Provides the `RequireAuth` extractor for
//! handlers; failures come back as JSON with a 401 status.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use precinct_core::{AuthContext, AuthError, AuthStore};
use serde::Serialize;
use std::sync::Arc;

/// JSON error response for auth failures
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl AuthErrorResponse {
    fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self { success: false, error: error.into(), code: code.into() }
    }
}

/// Auth rejection type
pub struct AuthRejection {
    status: StatusCode,
    body: AuthErrorResponse,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<AuthError> for AuthRejection {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => AuthRejection {
                status: StatusCode::UNAUTHORIZED,
                body: AuthErrorResponse::new(
                    "Authentication required. Provide Authorization: Bearer <token> or X-API-Key header.",
                    "unauthenticated",
                ),
            },
            AuthError::InvalidCredentials => AuthRejection {
                status: StatusCode::UNAUTHORIZED,
                body: AuthErrorResponse::new("Invalid token or API key", "invalid_credentials"),
            },
            AuthError::TokenRevoked => AuthRejection {
                status: StatusCode::UNAUTHORIZED,
                body: AuthErrorResponse::new("Token has been revoked", "token_revoked"),
            },
            AuthError::Internal(msg) => AuthRejection {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: AuthErrorResponse::new(msg, "internal_error"),
            },
        }
    }
}

/// Axum extractor that requires authentication.
///
/// Extracts the token from:
/// 1. `Authorization: Bearer <token>` header
/// 2. `X-API-Key: <key>` header
pub struct RequireAuth(pub AuthContext);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let auth_store = parts
            .extensions
            .get::<Arc<AuthStore>>()
            .ok_or_else(|| AuthError::Internal("AuthStore not configured".to_string()))?;

        // When auth is disabled the store resolves every request to the
        // anonymous high-command context; no token needed.
        if !auth_store.is_enabled() {
            return Ok(RequireAuth(auth_store.validate_token("")?));
        }

        let token = extract_token(parts)?;
        let ctx = auth_store.validate_token(&token)?;

        Ok(RequireAuth(ctx))
    }
}

/// Extract token from request headers
fn extract_token(parts: &Parts) -> std::result::Result<String, AuthError> {
    // 1. Authorization: Bearer <token>
    if let Some(auth_header) = parts.headers.get("authorization") {
        if let Ok(value) = auth_header.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Ok(token.trim().to_string());
            }
        }
    }

    // 2. X-API-Key header
    if let Some(api_key_header) = parts.headers.get("x-api-key") {
        if let Ok(value) = api_key_header.to_str() {
            return Ok(value.trim().to_string());
        }
    }

    Err(AuthError::MissingCredentials)
}
