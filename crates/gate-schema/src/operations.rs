//! # Operation Index
//!
//! Maps `(method, path template)` pairs from the document's `paths` to the
//! schema of their JSON request body and JSON responses, so the HTTP layer
//! can pick the validation target of a response without knowing the DTO.
//!
//! Only `application/json` (or `*+json`) content is indexed. Response
//! lookup tries the exact status, then the `2XX`-style range, then
//! `default`.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::document::PropertySchema;
use crate::error::DocumentError;
use crate::session::Target;

const METHODS: [&str; 8] = ["get", "put", "post", "delete", "options", "head", "patch", "trace"];

#[derive(Debug, Clone, Default)]
struct Operation {
    request_body: Option<Target>,
    responses: BTreeMap<String, Target>,
}

/// Request/response targets of every documented operation.
#[derive(Debug, Clone, Default)]
pub struct OperationIndex {
    operations: BTreeMap<(String, String), Operation>,
}

impl OperationIndex {
    /// Build the index from the `paths` object of an OpenAPI document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Malformed`] if `paths` is not an object and
    /// [`DocumentError::Json`] if a JSON media-type schema has the wrong
    /// structure.
    pub fn from_paths(paths: &Value) -> Result<Self, DocumentError> {
        let paths = paths
            .as_object()
            .ok_or_else(|| DocumentError::Malformed("paths must be an object".to_string()))?;

        let mut operations = BTreeMap::new();
        for (template, item) in paths {
            for method in METHODS {
                let Some(op) = item.get(method) else { continue };
                let origin = format!("{} {template}", method.to_uppercase());

                let request_body = match op.get("requestBody").and_then(json_schema) {
                    Some(raw) => Some(parse_target(raw, &origin)?),
                    None => None,
                };

                let mut responses = BTreeMap::new();
                if let Some(Value::Object(by_status)) = op.get("responses") {
                    for (status, response) in by_status {
                        if let Some(raw) = json_schema(response) {
                            responses.insert(status.to_ascii_uppercase(), parse_target(raw, &origin)?);
                        }
                    }
                }

                operations.insert(
                    (method.to_string(), template.clone()),
                    Operation {
                        request_body,
                        responses,
                    },
                );
            }
        }
        Ok(Self { operations })
    }

    /// Target of the JSON response of `method template` with `status`.
    pub fn response_target(&self, method: &str, template: &str, status: u16) -> Option<&Target> {
        let op = self.lookup(method, template)?;
        let exact = status.to_string();
        let range = format!("{}XX", status / 100);
        op.responses
            .get(&exact)
            .or_else(|| op.responses.get(&range))
            .or_else(|| op.responses.get("DEFAULT"))
    }

    /// Every indexed target, request bodies and responses alike, labelled
    /// with the operation it belongs to (`POST /v1/users request body`,
    /// `GET /v1/users 200`).
    pub fn targets(&self) -> Vec<(String, &Target)> {
        let mut targets = Vec::new();
        for ((method, template), op) in &self.operations {
            let operation = format!("{} {template}", method.to_uppercase());
            if let Some(body) = &op.request_body {
                targets.push((format!("{operation} request body"), body));
            }
            for (status, target) in &op.responses {
                targets.push((format!("{operation} {status}"), target));
            }
        }
        targets
    }

    /// Number of indexed operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if no operations are indexed.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    fn lookup(&self, method: &str, template: &str) -> Option<&Operation> {
        self.operations
            .get(&(method.to_ascii_lowercase(), template.to_string()))
    }
}

/// Schema of the JSON media type of a request body or response object.
fn json_schema(holder: &Value) -> Option<&Value> {
    let content = holder.get("content")?.as_object()?;
    content
        .iter()
        .find(|(media, _)| is_json_media_type(media))
        .and_then(|(_, media)| media.get("schema"))
}

fn is_json_media_type(media: &str) -> bool {
    let essence = media.split(';').next().unwrap_or(media).trim();
    essence == "application/json" || essence.ends_with("+json")
}

fn parse_target(raw: &Value, origin: &str) -> Result<Target, DocumentError> {
    let schema: PropertySchema =
        serde_json::from_value(raw.clone()).map_err(|source| DocumentError::Json {
            origin: origin.to_string(),
            source,
        })?;
    Ok(Target::from_schema(schema))
}
