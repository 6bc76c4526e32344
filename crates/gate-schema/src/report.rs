//! # Violation Reports
//!
//! Per-field failures collected while applying a validator, aggregated into
//! one [`ViolationReport`] per validation call and channel.
//!
//! Serialized form (this is what the HTTP layer puts under
//! `error.details.<channel>`):
//!
//! ```json
//! {
//!   "channel": "query",
//!   "target": "Query7",
//!   "issues": [
//!     {
//!       "path": ["nbr"],
//!       "code": "too_big",
//!       "expected": "number <= 23",
//!       "received": "24",
//!       "message": "must be less than or equal to 23"
//!     }
//!   ]
//! }
//! ```

use std::fmt;

use gate_core::{Channel, FieldPath};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed reason code of one failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Missing, or null where null is not allowed.
    Required,
    /// Value is not of (and cannot be coerced to) the expected kind.
    InvalidType,
    /// A number that should be an integer has a fractional part.
    NotInteger,
    /// Unparseable date or date-time.
    InvalidDate,
    /// Fails an email/url/uuid shape check.
    InvalidFormat,
    /// Not one of the enum values.
    InvalidEnumValue,
    /// Below `minimum`.
    TooSmall,
    /// Above `maximum`.
    TooBig,
    /// Shorter than `minLength`.
    TooShort,
    /// Longer than `maxLength`.
    TooLong,
    /// Does not match `pattern`.
    PatternMismatch,
    /// Fewer elements than `minItems`.
    TooFewItems,
    /// More elements than `maxItems`.
    TooManyItems,
    /// No union branch accepted the value.
    NoMatchingBranch,
    /// A named type had no compiled validator when it was reached.
    UnresolvedType,
}

impl Reason {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::InvalidType => "invalid_type",
            Self::NotInteger => "not_integer",
            Self::InvalidDate => "invalid_date",
            Self::InvalidFormat => "invalid_format",
            Self::InvalidEnumValue => "invalid_enum_value",
            Self::TooSmall => "too_small",
            Self::TooBig => "too_big",
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
            Self::PatternMismatch => "pattern_mismatch",
            Self::TooFewItems => "too_few_items",
            Self::TooManyItems => "too_many_items",
            Self::NoMatchingBranch => "no_matching_branch",
            Self::UnresolvedType => "unresolved_type",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Location of the value inside the payload.
    pub path: FieldPath,
    /// Reason code.
    pub code: Reason,
    /// Expected kind or constraint.
    pub expected: String,
    /// Textual form of the received value; `undefined` when absent.
    pub received: String,
    /// Human-readable description.
    pub message: String,
}

impl Issue {
    /// A kind mismatch: "expected X, received Y".
    pub fn mismatch(path: &FieldPath, code: Reason, expected: impl Into<String>, received: Option<&Value>) -> Self {
        let expected = expected.into();
        let received = describe(received);
        let message = format!("expected {expected}, received {received}");
        Self {
            path: path.clone(),
            code,
            expected,
            received,
            message,
        }
    }

    /// A constraint failure with its own message.
    pub fn constraint(
        path: &FieldPath,
        code: Reason,
        expected: impl Into<String>,
        received: &Value,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.clone(),
            code,
            expected: expected.into(),
            received: describe(Some(received)),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}: {} ({})", self.path, self.message, self.code)
    }
}

/// Textual form of a received value. Strings are shown unquoted.
pub(crate) fn describe(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// All failures of one validation call on one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationReport {
    /// Channel the value came from.
    pub channel: Channel,
    /// Type name, or a description of the inline schema.
    pub target: String,
    /// Failures in the order they were found.
    pub issues: Vec<Issue>,
}

impl ViolationReport {
    /// Build a report.
    pub fn new(channel: Channel, target: impl Into<String>, issues: Vec<Issue>) -> Self {
        Self {
            channel,
            target: target.into(),
            issues,
        }
    }

    /// Returns a slice of all issues.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Returns the number of issues.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns true if there are no issues.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Whether an issue with `code` was reported at the dotted `path`.
    pub fn has(&self, path: &str, code: Reason) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.code == code && issue.path.to_string() == path)
    }

    /// Reason codes in report order.
    pub fn codes(&self) -> Vec<Reason> {
        self.issues.iter().map(|issue| issue.code).collect()
    }
}

impl fmt::Display for ViolationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation failed for {}:", self.channel, self.target)?;
        for issue in &self.issues {
            write!(f, "\n{issue}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report() -> ViolationReport {
        let path = FieldPath::root().child("nbr");
        ViolationReport::new(
            Channel::Query,
            "Query7",
            vec![
                Issue::constraint(
                    &path,
                    Reason::TooBig,
                    "number <= 23",
                    &json!(24),
                    "must be less than or equal to 23",
                ),
                Issue::mismatch(&FieldPath::root().child("str"), Reason::Required, "string", None),
            ],
        )
    }

    #[test]
    fn serializes_issue_fields() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["channel"], "query");
        assert_eq!(json["issues"][0]["path"], json!(["nbr"]));
        assert_eq!(json["issues"][0]["code"], "too_big");
        assert_eq!(json["issues"][1]["received"], "undefined");
        assert_eq!(json["issues"][1]["message"], "expected string, received undefined");
    }

    #[test]
    fn display_lists_each_issue() {
        let text = report().to_string();
        assert!(text.starts_with("query validation failed for Query7:"));
        assert!(text.contains("\n  nbr: must be less than or equal to 23 (too_big)"));
        assert!(text.contains("\n  str: expected string, received undefined (required)"));
    }

    #[test]
    fn has_matches_path_and_code() {
        let report = report();
        assert!(report.has("nbr", Reason::TooBig));
        assert!(!report.has("nbr", Reason::TooSmall));
        assert_eq!(report.codes(), vec![Reason::TooBig, Reason::Required]);
    }

    #[test]
    fn strings_received_unquoted() {
        assert_eq!(describe(Some(&json!("abc"))), "abc");
        assert_eq!(describe(Some(&json!({"a": 1}))), "{\"a\":1}");
        assert_eq!(describe(Some(&Value::Null)), "null");
    }
}
