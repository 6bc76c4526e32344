//! # Error Hierarchy
//!
//! Errors raised while constructing the foundational newtypes. Each variant
//! carries the rejected input so a schema author can find it in their
//! document without guesswork.

use thiserror::Error;

/// Construction errors for the core newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A type name is empty or contains characters that cannot appear in a
    /// component key.
    #[error("invalid type name: \"{0}\" (expected a non-empty component key without '/' or whitespace)")]
    InvalidTypeName(String),

    /// A `$ref` string does not point into `#/components/schemas/`.
    #[error("invalid schema reference: \"{0}\" (expected #/components/schemas/<TypeName>)")]
    InvalidReference(String),
}
