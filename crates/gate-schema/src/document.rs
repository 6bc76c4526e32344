//! # Schema Document
//!
//! The structural half of the compiler input: named type definitions as they
//! appear under `components.schemas` of an OpenAPI document.
//!
//! Only the keywords the compiler understands are deserialized. Everything
//! else (`description`, `example`, `additionalProperties`, ...) is ignored.
//!
//! ## Accepted inputs
//!
//! - A full OpenAPI object. Schemas are read from `components.schemas` and
//!   response/request targets from `paths` (see [`OperationIndex`]).
//! - A bare map of `TypeName → schema`.
//!
//! Both JSON and YAML are accepted; [`SourceFormat::from_path`] picks the
//! parser from the file extension.

use std::collections::BTreeMap;
use std::path::Path;

use gate_core::TypeName;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DocumentError;
use crate::operations::OperationIndex;

/// Text format of a document or metadata file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// JSON text.
    Json,
    /// YAML text.
    Yaml,
}

impl SourceFormat {
    /// `.yaml` / `.yml` select YAML, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }

    /// Parse `content` into a JSON value tree.
    pub fn parse(self, content: &str, origin: &str) -> Result<Value, DocumentError> {
        match self {
            Self::Json => serde_json::from_str(content).map_err(|source| DocumentError::Json {
                origin: origin.to_string(),
                source,
            }),
            Self::Yaml => serde_yaml::from_str(content).map_err(|source| DocumentError::Yaml {
                origin: origin.to_string(),
                source,
            }),
        }
    }
}

/// Read a JSON or YAML file into a value tree.
pub(crate) fn read_value(path: &Path) -> Result<Value, DocumentError> {
    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.display().to_string(),
        source,
    })?;
    SourceFormat::from_path(path).parse(&content, &path.display().to_string())
}

/// The `type` keyword: a single kind, or an OpenAPI 3.1 list of kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    /// `"type": "string"`
    Single(String),
    /// `"type": ["string", "null"]`
    Many(Vec<String>),
}

impl TypeSpec {
    /// Split into the non-null kinds and whether `"null"` was listed.
    pub fn split_null(&self) -> (Vec<&str>, bool) {
        let all: Vec<&str> = match self {
            Self::Single(kind) => vec![kind.as_str()],
            Self::Many(kinds) => kinds.iter().map(String::as_str).collect(),
        };
        let has_null = all.contains(&"null");
        (all.into_iter().filter(|k| *k != "null").collect(), has_null)
    }
}

/// The `required` keyword: a list of property names on object schemas.
///
/// Some generators leave a boolean `required` on property schemas; it is
/// accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequiredSpec {
    /// Names of required properties.
    Names(Vec<String>),
    /// Property-level flag left by some generators.
    Flag(bool),
}

/// One schema object: a named type definition, a property, an array item or
/// a union branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    /// `type`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TypeSpec>,
    /// `format`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// `enum`
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// `oneOf`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<PropertySchema>>,
    /// `anyOf`, treated like `oneOf` (first matching branch wins).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<PropertySchema>>,
    /// `allOf`; only the single-member wrapper is supported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<PropertySchema>>,
    /// `$ref`
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// `items`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
    /// `minimum` (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// `maximum` (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// `minLength` (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// `maxLength` (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// `pattern`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// `minItems` (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    /// `maxItems` (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// `nullable` (OpenAPI 3.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    /// `properties` of an object schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, PropertySchema>>,
    /// `required` of an object schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<RequiredSpec>,
}

impl PropertySchema {
    /// Schema with only a `type` keyword.
    pub fn of_kind(kind: &str) -> Self {
        Self {
            kind: Some(TypeSpec::Single(kind.to_string())),
            ..Self::default()
        }
    }

    /// Schema with only a `$ref` to `name`.
    pub fn reference_to(name: &TypeName) -> Self {
        Self {
            reference: Some(name.to_reference()),
            ..Self::default()
        }
    }

    /// Whether this schema only admits `null` (`{"type": "null"}`).
    pub fn is_null_only(&self) -> bool {
        match &self.kind {
            Some(spec) => {
                let (kinds, has_null) = spec.split_null();
                has_null && kinds.is_empty()
            }
            None => false,
        }
    }

    /// Whether this schema describes an object with declared properties.
    pub fn is_object_like(&self) -> bool {
        if self.properties.is_some() {
            return true;
        }
        match &self.kind {
            Some(spec) => spec.split_null().0 == ["object"],
            None => false,
        }
    }

    /// Names listed in the object-level `required` keyword.
    pub fn required_names(&self) -> &[String] {
        match &self.required {
            Some(RequiredSpec::Names(names)) => names,
            _ => &[],
        }
    }

    /// Whether `name` is listed in the object-level `required` keyword.
    pub fn requires(&self, name: &str) -> bool {
        self.required_names().iter().any(|n| n == name)
    }

    /// Look up a declared property.
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.as_ref().and_then(|p| p.get(name))
    }
}

/// Named type definitions plus the operation index of a schema document.
#[derive(Debug, Clone, Default)]
pub struct SchemaDocument {
    schemas: BTreeMap<TypeName, PropertySchema>,
    operations: OperationIndex,
}

impl SchemaDocument {
    /// Build a document from already-parsed definitions.
    pub fn from_schemas(schemas: BTreeMap<TypeName, PropertySchema>) -> Self {
        Self {
            schemas,
            operations: OperationIndex::default(),
        }
    }

    /// Interpret a value tree as an OpenAPI object or a bare schema map.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Malformed`] when the tree is not an object
    /// or a component key is not a valid type name, and
    /// [`DocumentError::Json`] when a definition has the wrong structure.
    pub fn from_value(value: &Value) -> Result<Self, DocumentError> {
        let root = value
            .as_object()
            .ok_or_else(|| DocumentError::Malformed("document root must be an object".to_string()))?;

        let is_openapi = root.contains_key("openapi")
            || root.contains_key("swagger")
            || root.contains_key("components")
            || root.contains_key("paths");

        let empty = serde_json::Map::new();
        let raw_schemas = if is_openapi {
            match root.get("components").and_then(|c| c.get("schemas")) {
                Some(Value::Object(map)) => map,
                Some(_) => {
                    return Err(DocumentError::Malformed(
                        "components.schemas must be an object".to_string(),
                    ))
                }
                None => &empty,
            }
        } else {
            root
        };

        let mut schemas = BTreeMap::new();
        for (key, raw) in raw_schemas {
            let name = TypeName::new(key.as_str())
                .map_err(|e| DocumentError::Malformed(e.to_string()))?;
            let schema: PropertySchema =
                serde_json::from_value(raw.clone()).map_err(|source| DocumentError::Json {
                    origin: format!("components.schemas.{key}"),
                    source,
                })?;
            schemas.insert(name, schema);
        }

        let operations = match root.get("paths") {
            Some(paths) if is_openapi => OperationIndex::from_paths(paths)?,
            _ => OperationIndex::default(),
        };

        Ok(Self {
            schemas,
            operations,
        })
    }

    /// Parse JSON or YAML text.
    pub fn parse(content: &str, format: SourceFormat) -> Result<Self, DocumentError> {
        Self::from_value(&format.parse(content, "schema document")?)
    }

    /// Load a document from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        Self::from_value(&read_value(path.as_ref())?)
    }

    /// Definition of a named type.
    pub fn definition(&self, name: &TypeName) -> Option<&PropertySchema> {
        self.schemas.get(name)
    }

    /// Names of all defined types, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &TypeName> {
        self.schemas.keys()
    }

    /// Number of defined types.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns true if no types are defined.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Response and request-body targets indexed by operation.
    pub fn operations(&self) -> &OperationIndex {
        &self.operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_components_from_openapi_object() {
        let doc = SchemaDocument::from_value(&json!({
            "openapi": "3.0.0",
            "paths": {},
            "components": {
                "schemas": {
                    "Query1": {
                        "type": "object",
                        "properties": {
                            "str1": { "type": "string" },
                            "date": { "type": "string", "format": "date-time" }
                        },
                        "required": ["str1", "date"]
                    }
                }
            }
        }))
        .unwrap();
        assert_eq!(doc.len(), 1);
        let q1 = doc.definition(&TypeName::new("Query1").unwrap()).unwrap();
        assert!(q1.is_object_like());
        assert!(q1.requires("date"));
        assert!(!q1.requires("str2"));
        assert_eq!(
            q1.property("date").unwrap().format.as_deref(),
            Some("date-time")
        );
    }

    #[test]
    fn reads_bare_schema_map() {
        let doc = SchemaDocument::from_value(&json!({
            "Pet": { "type": "object", "properties": { "name": { "type": "string" } } }
        }))
        .unwrap();
        assert_eq!(doc.type_names().count(), 1);
        assert!(doc.operations().is_empty());
    }

    #[test]
    fn openapi_without_components_is_empty() {
        let doc = SchemaDocument::from_value(&json!({ "openapi": "3.1.0", "paths": {} })).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn rejects_non_object_root() {
        let err = SchemaDocument::from_value(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, DocumentError::Malformed(_)));
    }

    #[test]
    fn rejects_wrongly_typed_keyword() {
        let err = SchemaDocument::from_value(&json!({
            "Bad": { "type": "string", "minLength": "ten" }
        }))
        .unwrap_err();
        match err {
            DocumentError::Json { origin, .. } => assert_eq!(origin, "components.schemas.Bad"),
            other => panic!("expected Json error, got {other}"),
        }
    }

    #[test]
    fn type_list_splits_null() {
        let spec = TypeSpec::Many(vec!["string".to_string(), "null".to_string()]);
        let (kinds, has_null) = spec.split_null();
        assert_eq!(kinds, vec!["string"]);
        assert!(has_null);

        let null_only: PropertySchema = serde_json::from_value(json!({ "type": "null" })).unwrap();
        assert!(null_only.is_null_only());
    }

    #[test]
    fn property_level_required_flag_is_tolerated() {
        let prop: PropertySchema =
            serde_json::from_value(json!({ "type": "string", "required": true })).unwrap();
        assert_eq!(prop.required, Some(RequiredSpec::Flag(true)));
        assert!(prop.required_names().is_empty());
    }

    #[test]
    fn parses_yaml() {
        let yaml = r#"
components:
  schemas:
    UserQuery1:
      type: object
      properties:
        name:
          type: string
        age:
          type: number
          minimum: 0
          maximum: 120
      required: [name]
"#;
        let doc = SchemaDocument::parse(yaml, SourceFormat::Yaml).unwrap();
        let user = doc.definition(&TypeName::new("UserQuery1").unwrap()).unwrap();
        assert_eq!(user.property("age").unwrap().maximum, Some(120.0));
    }

    #[test]
    fn source_format_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("a/openapi.yml")), SourceFormat::Yaml);
        assert_eq!(SourceFormat::from_path(Path::new("a/openapi.yaml")), SourceFormat::Yaml);
        assert_eq!(SourceFormat::from_path(Path::new("a/openapi.json")), SourceFormat::Json);
        assert_eq!(SourceFormat::from_path(Path::new("openapi")), SourceFormat::Json);
    }
}
