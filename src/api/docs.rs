//! OpenAPI document assembly
//!
//! Collects the per-handler path annotations into one document and serves
//! it at `/api/v1/openapi.json`. No interactive UI is bundled; point any
//! OpenAPI viewer at the JSON.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use precinct_core::{
    ActionKind, ManageOutcome, ManageRequest, OfficerView, RankInfo, RosterEntry, UnitInfo,
    UnitLevel,
};

use super::ApiResponse;

/// Precinct API OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Precinct API",
        version = "0.1.0",
        description = "Roster and unit-management API for the department.

## Overview
- **Units**: catalog of sub-units with their rank ladders
- **Rosters**: per-unit member listings with derived permission levels
- **Management**: membership and rank changes, authorized hierarchically
- **Officers**: per-officer membership/rank/level lookup

## Authentication
Endpoints require an API key, either as `Authorization: Bearer <key>` or
an `X-API-Key` header.
",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        crate::api::units::list_units,
        crate::api::units::unit_roster,
        crate::api::units::manage_unit,
        crate::api::units::get_officer,
    ),
    components(
        schemas(
            ApiResponse<ManageOutcome>,
            ManageRequest,
            ManageOutcome,
            ActionKind,
            UnitInfo,
            RankInfo,
            RosterEntry,
            OfficerView,
            UnitLevel,
        )
    ),
    tags(
        (name = "units", description = "Unit catalog and roster management"),
        (name = "officers", description = "Officer lookup"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create documentation routes
pub fn docs_routes() -> Router {
    Router::new().route("/api/v1/openapi.json", get(openapi_json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_covers_all_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/units",
            "/api/v1/units/{unit}/roster",
            "/api/v1/units/{unit}/manage",
            "/api/v1/officers/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_document_registers_request_schema() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("ManageRequest"));
        assert!(json.contains("add-member"));
    }
}
