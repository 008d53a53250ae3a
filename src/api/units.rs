//! Unit management endpoints
//!
//! The write path (`POST /api/v1/units/:unit/manage`) runs the full
//! pipeline in the core manager: validate, resolve caller permissions,
//! authorize, mutate, persist-if-changed. The read surface exposes the
//! catalog, per-unit rosters and individual officers.

use axum::{
    extract::{Extension, Path},
    routing::{get, post},
    Json, Router,
};
use precinct_core::{ManageOutcome, ManageRequest, OfficerView, RosterEntry, RosterManager, UnitInfo};
use std::sync::Arc;

use super::{ApiError, ApiResponse};
use crate::middleware::auth::RequireAuth;

/// List the unit catalog with rank ladders
#[utoipa::path(
    get,
    path = "/api/v1/units",
    tag = "units",
    responses(
        (status = 200, description = "Unit catalog", body = Vec<UnitInfo>),
        (status = 401, description = "Unauthorized")
    ),
    security(("api_key" = []))
)]
pub async fn list_units(
    _auth: RequireAuth,
    Extension(manager): Extension<Arc<RosterManager>>,
) -> Json<ApiResponse<Vec<UnitInfo>>> {
    Json(ApiResponse::success(manager.catalog()))
}

/// List a unit's members with their derived levels
#[utoipa::path(
    get,
    path = "/api/v1/units/{unit}/roster",
    tag = "units",
    params(
        ("unit" = String, Path, description = "Unit id")
    ),
    responses(
        (status = 200, description = "Unit roster", body = Vec<RosterEntry>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Unknown unit")
    ),
    security(("api_key" = []))
)]
pub async fn unit_roster(
    Path(unit): Path<String>,
    _auth: RequireAuth,
    Extension(manager): Extension<Arc<RosterManager>>,
) -> Result<Json<ApiResponse<Vec<RosterEntry>>>, ApiError> {
    let roster = manager.unit_roster(&unit).await?;
    Ok(Json(ApiResponse::success(roster)))
}

/// Apply a membership or rank change to a target officer
#[utoipa::path(
    post,
    path = "/api/v1/units/{unit}/manage",
    tag = "units",
    params(
        ("unit" = String, Path, description = "Unit id")
    ),
    request_body = ManageRequest,
    responses(
        (status = 200, description = "Resulting roster state of the target", body = ManageOutcome),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Action denied"),
        (status = 404, description = "Unknown unit or officer"),
        (status = 409, description = "Record modified concurrently")
    ),
    security(("api_key" = []))
)]
pub async fn manage_unit(
    Path(unit): Path<String>,
    auth: RequireAuth,
    Extension(manager): Extension<Arc<RosterManager>>,
    Json(request): Json<ManageRequest>,
) -> Result<Json<ApiResponse<ManageOutcome>>, ApiError> {
    let outcome = manager.manage(&auth.0, &unit, &request).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// Look up one officer's memberships, ranks and levels
#[utoipa::path(
    get,
    path = "/api/v1/officers/{id}",
    tag = "officers",
    params(
        ("id" = String, Path, description = "Officer id")
    ),
    responses(
        (status = 200, description = "Officer view", body = OfficerView),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Unknown officer")
    ),
    security(("api_key" = []))
)]
pub async fn get_officer(
    Path(id): Path<String>,
    _auth: RequireAuth,
    Extension(manager): Extension<Arc<RosterManager>>,
) -> Result<Json<ApiResponse<OfficerView>>, ApiError> {
    let view = manager.officer(&id).await?;
    Ok(Json(ApiResponse::success(view)))
}

pub fn units_routes() -> Router {
    Router::new()
        .route("/api/v1/units", get(list_units))
        .route("/api/v1/units/:unit/roster", get(unit_roster))
        .route("/api/v1/units/:unit/manage", post(manage_unit))
        .route("/api/v1/officers/:id", get(get_officer))
}
