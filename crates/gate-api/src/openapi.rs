//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into a single OpenAPI document.
//! Served at `/openapi.json`, and used as the schema document of the
//! validation session when no external document is configured.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Components of the built-in document that are never validated: the
/// error envelope is produced by this crate, and its `details` field is
/// free-form.
pub const BUILTIN_EXCLUSIONS: [&str; 2] = ["ErrorBody", "ErrorDetail"];

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "openapi-gate demo API",
        version = "0.1.0",
        description = "Users API whose path, query, body and response values are validated against this document."
    ),
    paths(
        crate::routes::users::create_user,
        crate::routes::users::list_users,
        crate::routes::users::get_user,
    ),
    components(schemas(
        crate::routes::users::Role,
        crate::routes::users::CreateUser,
        crate::routes::users::UserView,
        crate::routes::users::UserListQuery,
        crate::routes::users::UserPath,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "users", description = "Users API"),
    )
)]
pub struct ApiDoc;

/// The built-in document as JSON.
pub fn document() -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(ApiDoc::openapi())
}

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
