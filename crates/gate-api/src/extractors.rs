//! # Schema-Validated Extractors
//!
//! [`ValidatedPath`], [`ValidatedQuery`] and [`ValidatedJson`] run the raw
//! request value through the validation session on the matching channel
//! before deserializing it into the handler's DTO. Handlers see coerced
//! values only: numbers parsed from query strings, dates normalised,
//! single query values wrapped into arrays where the schema wants a list.
//!
//! The DTO names its schema component through [`SchemaType`].
//!
//! ```ignore
//! async fn handler(ValidatedQuery(q): ValidatedQuery<UserListQuery>) -> ... { }
//! ```

use std::collections::HashMap;

use axum::async_trait;
use axum::extract::{FromRef, FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use gate_core::{Channel, TypeName};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::state::SchemaGate;

/// A DTO described by a named component of the schema document.
pub trait SchemaType {
    /// Component name under `#/components/schemas/`.
    const TYPE_NAME: &'static str;
}

/// Path parameters validated on the `path` channel.
#[derive(Debug, Clone)]
pub struct ValidatedPath<T>(pub T);

/// Query string validated on the `query` channel.
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

/// JSON body validated on the `body` channel.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

/// Validate `value` against `T`'s component and deserialize the coerced
/// result.
pub fn validate_as<T>(gate: &SchemaGate, value: Value, channel: Channel) -> Result<T, AppError>
where
    T: DeserializeOwned + SchemaType,
{
    let session = gate.session().ok_or(AppError::NotReady)?;
    let name = TypeName::new(T::TYPE_NAME).map_err(|e| AppError::Internal(e.to_string()))?;
    let coerced = session.validate_named(&value, &name, channel)?;
    serde_json::from_value(coerced)
        .map_err(|e| AppError::BadRequest(format!("{channel} does not match {name}: {e}")))
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + SchemaType,
    SchemaGate: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let value = Value::Object(params.into_iter().map(|(k, v)| (k, Value::String(v))).collect());
        validate_as(&SchemaGate::from_ref(state), value, Channel::Path).map(Self)
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + SchemaType,
    SchemaGate: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let value = query_value(parts.uri.query().unwrap_or_default());
        validate_as(&SchemaGate::from_ref(state), value, Channel::Query).map(Self)
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + SchemaType,
    SchemaGate: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        validate_as(&SchemaGate::from_ref(state), value, Channel::Body).map(Self)
    }
}

// -- Query-string decoding ----------------------------------------------------

/// Decode a query string into a JSON object of strings.
///
/// `a[b]=1` nests, `a[]=1` always yields an array, and a key repeated at the
/// same level collects its values into an array in order of appearance.
pub fn query_value(query: &str) -> Value {
    let mut root = Map::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if key.is_empty() {
            continue;
        }
        let segments = key_segments(&key);
        insert_at(&mut root, &segments, value.into_owned());
    }
    Value::Object(root)
}

/// `a[b][]` → `["a", "b", ""]`. A key with unbalanced brackets is taken
/// literally.
fn key_segments(key: &str) -> Vec<&str> {
    let Some(open) = key.find('[') else {
        return vec![key];
    };
    if open == 0 {
        return vec![key];
    }
    let mut segments = vec![&key[..open]];
    let mut rest = &key[open..];
    while let Some(tail) = rest.strip_prefix('[') {
        let Some(close) = tail.find(']') else {
            return vec![key];
        };
        segments.push(&tail[..close]);
        rest = &tail[close + 1..];
    }
    if !rest.is_empty() {
        return vec![key];
    }
    segments
}

fn insert_at(target: &mut Map<String, Value>, segments: &[&str], value: String) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    match rest {
        [] => append(target, head, value),
        [next, ..] if next.is_empty() => {
            let slot = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            match slot {
                Value::Array(items) => items.push(Value::String(value)),
                other => {
                    let previous = other.take();
                    *other = Value::Array(vec![previous, Value::String(value)]);
                }
            }
        }
        _ => {
            let slot = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(nested) = slot {
                insert_at(nested, rest, value);
            }
        }
    }
}

fn append(target: &mut Map<String, Value>, key: &str, value: String) {
    match target.get_mut(key) {
        None => {
            target.insert(key.to_string(), Value::String(value));
        }
        Some(Value::Array(items)) => items.push(Value::String(value)),
        Some(existing) => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, Value::String(value)]);
        }
    }
}
