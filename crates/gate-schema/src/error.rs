//! # Schema Errors
//!
//! Two error families live here and are never mixed:
//!
//! - [`DocumentError`]: the schema document or field-metadata input could
//!   not be read or does not have the expected structure.
//! - [`CompileError`]: the inputs parsed, but they disagree with each other
//!   (dangling `$ref`, metadata field missing from the document, unknown
//!   primitive kind, constraint on the wrong kind). These are authoring
//!   mistakes and abort compilation of the endpoint; they are never turned
//!   into per-request validation failures.
//!
//! Validation failures are not errors of this module; they are collected in
//! a [`ViolationReport`](crate::report::ViolationReport).

use gate_core::CoreError;
use thiserror::Error;

/// Failure to load a schema document or field-metadata table.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file could not be read.
    #[error("cannot read '{path}': {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The input is not valid JSON, or does not deserialize into the
    /// expected structure.
    #[error("invalid JSON in {origin}: {source}")]
    Json {
        /// What was being parsed (file path or component name).
        origin: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The input is not valid YAML.
    #[error("invalid YAML in {origin}: {source}")]
    Yaml {
        /// What was being parsed.
        origin: String,
        /// Underlying parse error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The document parsed but its top-level structure is wrong.
    #[error("malformed schema document: {0}")]
    Malformed(String),

    /// A field-metadata entry has an impossible shape.
    #[error("malformed field metadata for '{owner}': {reason}")]
    MalformedMetadata {
        /// Type (or type.field) the entry belongs to.
        owner: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Schema/metadata inconsistency detected while compiling a validator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// A reference names a type that is not in the schema document.
    #[error("unknown type '{name}' referenced from {location}")]
    UnknownType {
        /// The missing type name.
        name: String,
        /// Where the reference was found.
        location: String,
    },

    /// A field listed in the field metadata has no property of the same name
    /// in the schema document.
    #[error("field '{field}' of {owner} is declared in the field metadata but missing from the schema document")]
    UnknownField {
        /// Owning type (or inline object location).
        owner: String,
        /// The unmatched field name.
        field: String,
    },

    /// A `type` keyword outside string/number/integer/boolean/array/object.
    #[error("unknown primitive kind '{kind}' at {location}")]
    UnknownKind {
        /// The unrecognised kind.
        kind: String,
        /// Where it was found.
        location: String,
    },

    /// Neither the schema document nor the field metadata names a type.
    #[error("no type information at {location}")]
    MissingType {
        /// Where the type was expected.
        location: String,
    },

    /// A constraint was attached to a kind it cannot apply to.
    #[error("constraint '{constraint}' does not apply to {kind} at {location}")]
    ConstraintNotApplicable {
        /// The constraint keyword.
        constraint: &'static str,
        /// The kind it was attached to.
        kind: String,
        /// Where it was found.
        location: String,
    },

    /// A `pattern` is not a valid regular expression.
    #[error("invalid pattern '{pattern}' at {location}: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Where it was found.
        location: String,
        /// Regex compiler message.
        reason: String,
    },

    /// An `enum` is empty or holds non-string values.
    #[error("invalid enum at {location}: {reason}")]
    InvalidEnum {
        /// Where it was found.
        location: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A schema construct this compiler does not model.
    #[error("unsupported schema construct at {location}: {feature}")]
    Unsupported {
        /// Where it was found.
        location: String,
        /// Description of the construct.
        feature: String,
    },

    /// A `$ref` that does not point into `#/components/schemas/`.
    #[error("invalid reference at {location}: {source}")]
    InvalidReference {
        /// Where it was found.
        location: String,
        /// Parse failure.
        #[source]
        source: CoreError,
    },
}
