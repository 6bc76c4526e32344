//! # Field Metadata
//!
//! The side-channel half of the compiler input. For each named type it lists
//! the fields to validate, whether each is required, an optional nullable
//! override, and the field's type shape as the DTO author declared it.
//!
//! The shape replaces the lazily evaluated `type` accessors of annotation
//! driven frameworks with plain data resolved by name at compile time:
//!
//! ```json
//! {
//!   "Query6": { "arr":    { "required": true, "type": ["Query4"] } },
//!   "Query10": { "arr2d": { "required": true, "type": [["String"]] } },
//!   "Query8": {
//!     "nested": {
//!       "required": true,
//!       "type": { "long": { "required": true, "type": { "prop": { "type": "Number" } } } }
//!     }
//!   }
//! }
//! ```
//!
//! - `"String"`, `"Number"`, `"Boolean"`, `"Date"`: scalar kinds;
//! - `"Object"` (or no `type`): the document alone describes the field;
//! - any other string: a named type;
//! - a one-element list: an array of that shape;
//! - an object: an inline nested shape with its own field metadata.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use gate_core::TypeName;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::document::{read_value, SourceFormat};
use crate::error::DocumentError;

/// Scalar kinds a DTO field can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// Text.
    String,
    /// Any number.
    Number,
    /// `true` / `false`.
    Boolean,
    /// Calendar date-time.
    Date,
}

/// Declared type shape of one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldShape {
    /// Nothing declared beyond "some object"; the document decides.
    #[default]
    Unspecified,
    /// A scalar kind.
    Scalar(ScalarType),
    /// A named type from the schema document.
    Named(TypeName),
    /// An inline nested object with its own field metadata.
    Inline(BTreeMap<String, FieldMetadata>),
    /// An ordered sequence of the inner shape.
    Array(Box<FieldShape>),
}

impl FieldShape {
    /// Element shape if this is an array shape.
    pub fn element(&self) -> Option<&FieldShape> {
        match self {
            Self::Array(inner) => Some(inner),
            _ => None,
        }
    }

    /// Nested field metadata if this is an inline shape.
    pub fn inline_fields(&self) -> Option<&BTreeMap<String, FieldMetadata>> {
        match self {
            Self::Inline(fields) => Some(fields),
            _ => None,
        }
    }
}

impl fmt::Display for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => f.write_str("Object"),
            Self::Scalar(ScalarType::String) => f.write_str("String"),
            Self::Scalar(ScalarType::Number) => f.write_str("Number"),
            Self::Scalar(ScalarType::Boolean) => f.write_str("Boolean"),
            Self::Scalar(ScalarType::Date) => f.write_str("Date"),
            Self::Named(name) => write!(f, "{name}"),
            Self::Inline(_) => f.write_str("{...}"),
            Self::Array(inner) => write!(f, "[{inner}]"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawShape {
    Keyword(String),
    List(Vec<FieldShape>),
    Inline(BTreeMap<String, FieldMetadata>),
}

impl<'de> Deserialize<'de> for FieldShape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawShape::deserialize(deserializer)? {
            RawShape::Keyword(word) => Ok(match word.as_str() {
                "String" | "string" => Self::Scalar(ScalarType::String),
                "Number" | "number" => Self::Scalar(ScalarType::Number),
                "Boolean" | "boolean" => Self::Scalar(ScalarType::Boolean),
                "Date" => Self::Scalar(ScalarType::Date),
                "Object" | "object" => Self::Unspecified,
                _ => Self::Named(TypeName::new(word).map_err(de::Error::custom)?),
            }),
            RawShape::List(mut items) => {
                if items.len() != 1 {
                    return Err(de::Error::custom(format!(
                        "array shape must hold exactly one element type, found {}",
                        items.len()
                    )));
                }
                Ok(Self::Array(Box::new(items.remove(0))))
            }
            RawShape::Inline(fields) => Ok(Self::Inline(fields)),
        }
    }
}

fn default_required() -> bool {
    true
}

/// Static metadata of one field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldMetadata {
    /// Whether the field must be present. Defaults to `true`.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Overrides the document's `nullable` when set.
    #[serde(default)]
    pub nullable: Option<bool>,
    /// Declared type shape.
    #[serde(rename = "type", default)]
    pub shape: FieldShape,
}

impl FieldMetadata {
    /// Metadata with the given required flag and shape.
    pub fn new(required: bool, shape: FieldShape) -> Self {
        Self {
            required,
            nullable: None,
            shape,
        }
    }

    /// Set the nullable override.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }
}

/// Field metadata of one named type, keyed by field name.
pub type TypeFields = BTreeMap<String, FieldMetadata>;

/// Field metadata for every declared type.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    types: BTreeMap<TypeName, TypeFields>,
}

impl MetadataTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the fields of `name`, replacing any previous declaration.
    pub fn declare(&mut self, name: TypeName, fields: TypeFields) -> Option<TypeFields> {
        self.types.insert(name, fields)
    }

    /// Fields declared for `name`.
    pub fn fields(&self, name: &TypeName) -> Option<&TypeFields> {
        self.types.get(name)
    }

    /// Declared type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &TypeName> {
        self.types.keys()
    }

    /// Number of declared types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Interpret a value tree of `TypeName → field → metadata`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::MalformedMetadata`] naming the offending type.
    pub fn from_value(value: &Value) -> Result<Self, DocumentError> {
        let root = value.as_object().ok_or_else(|| DocumentError::MalformedMetadata {
            owner: "(root)".to_string(),
            reason: "metadata root must be an object".to_string(),
        })?;

        let mut table = Self::new();
        for (key, raw) in root {
            let name = TypeName::new(key.as_str()).map_err(|e| DocumentError::MalformedMetadata {
                owner: key.clone(),
                reason: e.to_string(),
            })?;
            let fields: TypeFields =
                serde_json::from_value(raw.clone()).map_err(|e| DocumentError::MalformedMetadata {
                    owner: key.clone(),
                    reason: e.to_string(),
                })?;
            table.declare(name, fields);
        }
        Ok(table)
    }

    /// Parse JSON or YAML text.
    pub fn parse(content: &str, format: SourceFormat) -> Result<Self, DocumentError> {
        Self::from_value(&format.parse(content, "field metadata")?)
    }

    /// Load a table from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        Self::from_value(&read_value(path.as_ref())?)
    }
}
