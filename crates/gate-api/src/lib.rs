//! # gate-api: Axum Integration for openapi-gate
//!
//! Wires the validation session of `gate-schema` into an axum service.
//!
//! ## API Surface
//!
//! | Prefix              | Module                 | Purpose                     |
//! |---------------------|------------------------|-----------------------------|
//! | `/v1/users/*`       | [`routes::users`]      | Demo resource, all channels |
//! | `/openapi.json`     | [`openapi`]            | Built-in schema document    |
//! | `/health/*`         | this module            | Liveness and readiness      |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → ResponseValidation → Handler (ValidatedPath / ValidatedQuery / ValidatedJson)
//! ```
//!
//! ## Readiness
//!
//! The schema store is loaded on a background task ([`bootstrap::spawn_loader`]).
//! Until it is installed in the [`state::SchemaGate`], validated extractors
//! reject with 503 `NOT_READY` and `/health/readiness` answers 503.

pub mod bootstrap;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;

use crate::state::{AppState, SchemaGate};

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::users::router())
        .layer(from_fn_with_state(
            state.gate.clone(),
            middleware::response_validation::validate_response,
        ))
        .merge(openapi::router())
        .layer(middleware::tracing_layer::layer())
        .with_state(state.clone());

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(state.gate);

    Router::new().merge(health).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the schema store is installed, 503 before.
async fn readiness(State(gate): State<SchemaGate>) -> (StatusCode, &'static str) {
    if gate.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}
