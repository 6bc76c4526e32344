//! # Schema Nodes
//!
//! The closed shape vocabulary the compiler walks. A node is produced by
//! merging the schema document with the field metadata (see
//! [`merge`](crate::merge)) and consumed by the
//! [`Compiler`](crate::compiler::Compiler).
//!
//! Constraints are typed per primitive kind. Which keyword may sit on which
//! kind is decided once, by [`Primitive::new`], so a `pattern` on a number
//! is a [`CompileError`] rather than a check that silently never fires.

use std::collections::BTreeMap;
use std::fmt;

use gate_core::TypeName;

use crate::error::CompileError;

/// One validatable shape plus its nullability.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// The shape.
    pub kind: NodeKind,
    /// Whether the literal null is accepted in addition to the shape.
    pub nullable: bool,
    /// `nullable` was set by field metadata. A reference then keeps it
    /// instead of inheriting the referenced type's own nullability.
    pub nullable_pinned: bool,
}

impl SchemaNode {
    /// Non-nullable node of `kind`.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            nullable: false,
            nullable_pinned: false,
        }
    }

    /// Set nullability.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Reference to a named type.
    pub fn reference(name: TypeName) -> Self {
        Self::new(NodeKind::Reference(name))
    }

    /// Unconstrained primitive of `kind`.
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::new(NodeKind::Primitive(Primitive::plain(kind)))
    }
}

/// Shape variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// string / number / integer / boolean with format and constraints.
    Primitive(Primitive),
    /// One of a fixed, ordered set of strings.
    Enum(Vec<String>),
    /// At least two alternatives; the first accepting branch wins.
    Union(Vec<SchemaNode>),
    /// Ordered sequence of one element shape.
    Array {
        /// Element shape.
        element: Box<SchemaNode>,
        /// `minItems`
        min_items: Option<usize>,
        /// `maxItems`
        max_items: Option<usize>,
    },
    /// Inline object.
    Object(BTreeMap<String, Field>),
    /// A named type, resolved by name at compile time.
    Reference(TypeName),
}

/// A property of an object node.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// The property's shape.
    pub node: SchemaNode,
    /// Whether the property must be present.
    pub required: bool,
}

/// The four primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// Text.
    String,
    /// Any finite number.
    Number,
    /// Integral number.
    Integer,
    /// `true` / `false`.
    Boolean,
}

impl PrimitiveKind {
    /// Parse an OpenAPI `type` keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// The OpenAPI keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Integer)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recognised string formats. Anything else is [`Format::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// No shape check.
    #[default]
    None,
    /// RFC 3339 date-time.
    DateTime,
    /// RFC 3339 full-date.
    Date,
    /// Email address.
    Email,
    /// Absolute URL.
    Url,
    /// RFC 4122 UUID.
    Uuid,
}

impl Format {
    /// Map an OpenAPI `format` keyword. Numeric formats such as `int64`
    /// carry no check and map to `None`.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "date-time" => Self::DateTime,
            "date" => Self::Date,
            "email" => Self::Email,
            "url" | "uri" => Self::Url,
            "uuid" => Self::Uuid,
            _ => Self::None,
        }
    }

    /// The OpenAPI keyword, `None` for no format.
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::DateTime => Some("date-time"),
            Self::Date => Some("date"),
            Self::Email => Some("email"),
            Self::Url => Some("url"),
            Self::Uuid => Some("uuid"),
        }
    }
}

/// Bounds and shape constraints of a primitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    /// Inclusive lower bound.
    pub minimum: Option<f64>,
    /// Inclusive upper bound.
    pub maximum: Option<f64>,
    /// Inclusive minimum length in characters.
    pub min_length: Option<usize>,
    /// Inclusive maximum length in characters.
    pub max_length: Option<usize>,
    /// Full-value regular expression.
    pub pattern: Option<String>,
}

impl Constraints {
    /// Returns true if no constraint is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A primitive whose format and constraints are legal for its kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    kind: PrimitiveKind,
    format: Format,
    constraints: Constraints,
}

impl Primitive {
    /// Primitive with no format or constraints.
    pub fn plain(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            format: Format::None,
            constraints: Constraints::default(),
        }
    }

    /// Check the constraint table and build a primitive.
    ///
    /// | keyword                 | kinds            |
    /// |-------------------------|------------------|
    /// | `minimum` / `maximum`   | number, integer  |
    /// | `minLength`/`maxLength` | string           |
    /// | `pattern`               | string           |
    /// | recognised `format`     | string           |
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::ConstraintNotApplicable`] for any keyword
    /// outside its row.
    pub fn new(
        kind: PrimitiveKind,
        format: Format,
        constraints: Constraints,
        location: &str,
    ) -> Result<Self, CompileError> {
        let reject = |constraint: &'static str| CompileError::ConstraintNotApplicable {
            constraint,
            kind: kind.as_str().to_string(),
            location: location.to_string(),
        };

        if !kind.is_numeric() {
            if constraints.minimum.is_some() {
                return Err(reject("minimum"));
            }
            if constraints.maximum.is_some() {
                return Err(reject("maximum"));
            }
        }
        if kind != PrimitiveKind::String {
            if constraints.min_length.is_some() {
                return Err(reject("minLength"));
            }
            if constraints.max_length.is_some() {
                return Err(reject("maxLength"));
            }
            if constraints.pattern.is_some() {
                return Err(reject("pattern"));
            }
            if let Some(keyword) = format.keyword() {
                return Err(CompileError::ConstraintNotApplicable {
                    constraint: "format",
                    kind: format!("{kind} (format {keyword})"),
                    location: location.to_string(),
                });
            }
        }

        Ok(Self {
            kind,
            format,
            constraints,
        })
    }

    /// The kind.
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// The format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// The constraints.
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }
}
