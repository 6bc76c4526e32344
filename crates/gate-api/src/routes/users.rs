//! # Users API
//!
//! Demo resource whose DTOs are the schema components the validators are
//! compiled from (via the utoipa-generated document).
//!
//! ## Endpoints
//!
//! - `POST /v1/users`: create user
//! - `GET /v1/users`: list users, filtered by query
//! - `GET /v1/users/:id`: get user

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ErrorBody;
use crate::error::AppError;
use crate::extractors::{SchemaType, ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Role granted to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Member,
    Guest,
}

/// Request to create a user.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUser {
    /// Display name.
    #[schema(min_length = 1, max_length = 64)]
    pub name: String,
    /// Contact address.
    #[schema(pattern = "[^@\\s]+@[^@\\s]+")]
    pub email: String,
    #[schema(minimum = 0, maximum = 150)]
    pub age: Option<i64>,
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Calendar date of birth.
    pub born_on: Option<NaiveDate>,
}

impl SchemaType for CreateUser {
    const TYPE_NAME: &'static str = "CreateUser";
}

/// A stored user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: Option<i64>,
    pub roles: Vec<Role>,
    pub born_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Query of `GET /v1/users`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserListQuery {
    /// Maximum number of users returned.
    #[schema(minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
    /// Only users holding this role.
    pub role: Option<Role>,
    /// Only these users. A single `ids=` value is accepted as a list.
    pub ids: Option<Vec<Uuid>>,
}

impl SchemaType for UserListQuery {
    const TYPE_NAME: &'static str = "UserListQuery";
}

/// Path of `GET /v1/users/:id`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserPath {
    pub id: Uuid,
}

impl SchemaType for UserPath {
    const TYPE_NAME: &'static str = "UserPath";
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/users", get(list_users).post(create_user))
        .route("/v1/users/:id", get(get_user))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/users: Create a user.
#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserView),
        (status = 400, description = "Validation error", body = ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUser>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    let user = UserView {
        id: Uuid::new_v4(),
        name: req.name,
        email: req.email,
        age: req.age,
        roles: req.roles,
        born_on: req.born_on,
        created_at: Utc::now(),
    };
    state.users.insert(user.id, user.clone());
    tracing::info!(user_id = %user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /v1/users: List users.
#[utoipa::path(
    get,
    path = "/v1/users",
    params(
        ("limit" = Option<i64>, Query, description = "Maximum number of users returned"),
        ("role" = Option<Role>, Query, description = "Only users holding this role"),
        ("ids" = Option<Vec<Uuid>>, Query, description = "Only these users"),
    ),
    responses(
        (status = 200, description = "Matching users", body = [UserView]),
        (status = 400, description = "Validation error", body = ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn list_users(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<UserListQuery>,
) -> Json<Vec<UserView>> {
    let mut users: Vec<UserView> = state
        .users
        .list()
        .into_iter()
        .filter(|u| query.role.map_or(true, |role| u.roles.contains(&role)))
        .filter(|u| query.ids.as_ref().map_or(true, |ids| ids.contains(&u.id)))
        .collect();
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    if let Some(limit) = query.limit {
        users.truncate(usize::try_from(limit).unwrap_or(0));
    }
    Json(users)
}

/// GET /v1/users/:id: Get a user.
#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserView),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn get_user(
    State(state): State<AppState>,
    ValidatedPath(path): ValidatedPath<UserPath>,
) -> Result<Json<UserView>, AppError> {
    state
        .users
        .get(&path.id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {}", path.id)))
}
