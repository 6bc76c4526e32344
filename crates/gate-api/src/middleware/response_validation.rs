//! # Response Validation
//!
//! Validates the JSON body a handler produced against the response schema
//! the document declares for `(method, route template, status)`, on the
//! `response` channel, and replaces the body with the coerced value.
//!
//! Before the gate is ready every routed request is answered with 503 and
//! the handler does not run, so no response leaves unvalidated. Once ready,
//! responses pass through untouched when the route is undocumented, the
//! status has no JSON schema, or the body is not JSON. A response that
//! fails validation becomes a 500; the report is logged, never sent.

use axum::body::{Body, Bytes};
use axum::extract::{MatchedPath, Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use gate_core::Channel;

use crate::error::AppError;
use crate::state::SchemaGate;

/// Upper bound on a buffered response body.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Middleware entry point; install with `axum::middleware::from_fn_with_state`.
pub async fn validate_response(State(gate): State<SchemaGate>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let template = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| openapi_template(matched.as_str()));

    let Some(template) = template else {
        return next.run(request).await;
    };
    let Some(session) = gate.session().cloned() else {
        return AppError::NotReady.into_response();
    };

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let Some(target) = session
        .store()
        .operations()
        .response_target(method.as_str(), &template, status)
        .cloned()
    else {
        return response;
    };
    if !is_json(response.headers()) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => return AppError::Internal(format!("buffering response body: {e}")).into_response(),
    };
    if bytes.is_empty() {
        return Response::from_parts(parts, Body::from(bytes));
    }
    let value: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(e) => return AppError::Internal(format!("handler produced invalid JSON: {e}")).into_response(),
    };

    match session.validate(&value, &target, Channel::Response) {
        Ok(coerced) => match serde_json::to_vec(&coerced) {
            Ok(encoded) => {
                parts.headers.remove(CONTENT_LENGTH);
                Response::from_parts(parts, Body::from(Bytes::from(encoded)))
            }
            Err(e) => AppError::Internal(format!("re-encoding response: {e}")).into_response(),
        },
        Err(err) => {
            tracing::error!(method = %method, route = %template, status, "response failed validation");
            AppError::from(err).into_response()
        }
    }
}

/// `/v1/users/:id` → `/v1/users/{id}`; wildcards `*rest` → `{rest}`.
pub fn openapi_template(route: &str) -> String {
    route
        .split('/')
        .map(|segment| match segment.strip_prefix(':').or_else(|| segment.strip_prefix('*')) {
            Some(name) => format!("{{{name}}}"),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let essence = value.split(';').next().unwrap_or(value).trim();
            essence == "application/json" || essence.ends_with("+json")
        })
        .unwrap_or(false)
}
