//! # Type Names
//!
//! A [`TypeName`] identifies one named type in the schema document
//! (`components.schemas.<name>`). References in the document use the form
//! `#/components/schemas/<name>`; only the trailing name is significant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

/// Prefix of every reference into the component schemas.
pub const COMPONENTS_PREFIX: &str = "#/components/schemas/";

/// Name of a type registered in the schema document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Create a type name, validating its shape.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTypeName`] if the name is empty or
    /// contains `/` or whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
        let s = value.into();
        if s.is_empty() || s.contains('/') || s.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidTypeName(s));
        }
        Ok(Self(s))
    }

    /// Parse a `$ref` value and return the referenced type name.
    ///
    /// Only the trailing segment of a local pointer is significant:
    /// `#/components/schemas/Pet` and `#/definitions/Pet` both name `Pet`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidReference`] for a non-local reference or
    /// an empty trailing segment.
    pub fn from_reference(reference: &str) -> Result<Self, CoreError> {
        let name = reference
            .strip_prefix("#/")
            .and_then(|pointer| pointer.rsplit('/').next())
            .ok_or_else(|| CoreError::InvalidReference(reference.to_string()))?;
        Self::new(name).map_err(|_| CoreError::InvalidReference(reference.to_string()))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical `$ref` pointing at this type.
    pub fn to_reference(&self) -> String {
        format!("{COMPONENTS_PREFIX}{}", self.0)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TypeName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for TypeName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        let name = TypeName::new("Query1").unwrap();
        assert_eq!(name.as_str(), "Query1");
        assert_eq!(name.to_string(), "Query1");
    }

    #[test]
    fn rejects_empty_and_slashed_names() {
        assert!(TypeName::new("").is_err());
        assert!(TypeName::new("a/b").is_err());
        assert!(TypeName::new("has space").is_err());
    }

    #[test]
    fn parses_component_reference() {
        let name = TypeName::from_reference("#/components/schemas/UserQuery2Options").unwrap();
        assert_eq!(name.as_str(), "UserQuery2Options");
        assert_eq!(name.to_reference(), "#/components/schemas/UserQuery2Options");
    }

    #[test]
    fn parses_legacy_definitions_reference() {
        let name = TypeName::from_reference("#/definitions/Pet").unwrap();
        assert_eq!(name.as_str(), "Pet");
    }

    #[test]
    fn only_trailing_segment_is_significant() {
        let name = TypeName::from_reference("#/components/responses/Pet").unwrap();
        assert_eq!(name.as_str(), "Pet");
        assert_eq!(TypeName::from_reference("#/Pet").unwrap().as_str(), "Pet");
    }

    #[test]
    fn rejects_foreign_reference() {
        let err = TypeName::from_reference("https://example.com/schema.json").unwrap_err();
        assert!(matches!(err, CoreError::InvalidReference(_)));
        let err = TypeName::from_reference("#/components/schemas/").unwrap_err();
        assert!(matches!(err, CoreError::InvalidReference(_)));
    }

    #[test]
    fn deserialize_validates() {
        let ok: TypeName = serde_json::from_str("\"Query4\"").unwrap();
        assert_eq!(ok.as_str(), "Query4");
        let bad: Result<TypeName, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }
}
