//! # Compiled Validators
//!
//! A [`Validator`] is the executable form of one [`SchemaNode`](crate::node::SchemaNode):
//! the presence wrapper (required / nullable) around a [`Rule`] for the
//! value itself.
//!
//! ## Presence
//!
//! | value      | required | nullable | outcome                        |
//! |------------|----------|----------|--------------------------------|
//! | absent     | no       | any      | valid, field omitted           |
//! | absent     | yes      | any      | `required`                     |
//! | `null`     | any      | yes      | valid, `null` kept             |
//! | `null`     | no       | no       | valid, field omitted           |
//! | `null`     | yes      | no       | `required`                     |
//! | otherwise  | any      | any      | the rule decides               |
//!
//! On the path and query channels the literal string `"undefined"` counts as
//! absent.
//!
//! Application never stops at the first failure: every failing field, every
//! failing array index, is reported.

use std::collections::BTreeMap;

use gate_core::{FieldPath, TypeName};
use regex::Regex;
use serde_json::{Map, Value};

use crate::coerce;
use crate::compiler::ValidatorCache;
use crate::node::Format;
use crate::report::{Issue, Reason};

/// Executable validator for one node.
#[derive(Debug, Clone)]
pub struct Validator {
    pub(crate) required: bool,
    pub(crate) nullable: bool,
    pub(crate) rule: Rule,
}

/// Value check of a validator, after presence handling.
#[derive(Debug, Clone)]
pub(crate) enum Rule {
    /// Anything goes. Tagged with the excluded type name, if any.
    Accept(Option<TypeName>),
    String(StringRule),
    Number(NumberRule),
    Boolean,
    Enum(Vec<String>),
    Union(Vec<Validator>),
    Array {
        element: Box<Validator>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Object(BTreeMap<String, Validator>),
    /// Delegates to the cached validator of a named type.
    Named(TypeName),
}

#[derive(Debug, Clone)]
pub(crate) struct StringRule {
    pub(crate) format: Format,
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
    pub(crate) pattern: Option<(Regex, String)>,
}

#[derive(Debug, Clone)]
pub(crate) struct NumberRule {
    pub(crate) integer: bool,
    pub(crate) minimum: Option<f64>,
    pub(crate) maximum: Option<f64>,
}

/// What a validator needs besides its own tree.
pub(crate) struct ApplyContext<'a> {
    pub(crate) cache: &'a ValidatorCache,
    pub(crate) string_encoded: bool,
}

impl Validator {
    /// Whether an absent value is a failure.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether the literal null is accepted.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether this validator accepts any value.
    pub fn accepts_anything(&self) -> bool {
        matches!(self.rule, Rule::Accept(_))
    }

    /// Short description of the expected value.
    pub fn expected(&self) -> String {
        match &self.rule {
            Rule::Accept(Some(name)) => name.to_string(),
            Rule::Accept(None) => "any".to_string(),
            Rule::String(rule) => rule.format.keyword().unwrap_or("string").to_string(),
            Rule::Number(rule) if rule.integer => "integer".to_string(),
            Rule::Number(_) => "number".to_string(),
            Rule::Boolean => "boolean".to_string(),
            Rule::Enum(values) => values
                .iter()
                .map(|v| format!("'{v}'"))
                .collect::<Vec<_>>()
                .join(" | "),
            Rule::Union(branches) => branches
                .iter()
                .map(Validator::expected)
                .collect::<Vec<_>>()
                .join(" | "),
            Rule::Array { element, .. } => format!("{}[]", element.expected()),
            Rule::Object(_) => "object".to_string(),
            Rule::Named(name) => name.to_string(),
        }
    }

    /// Apply presence handling, then the rule. Returns the coerced value,
    /// or `None` when the value is omitted from the output. The output is
    /// meaningless if `issues` grew.
    pub(crate) fn apply(
        &self,
        input: Option<&Value>,
        cx: &ApplyContext<'_>,
        path: &mut FieldPath,
        issues: &mut Vec<Issue>,
    ) -> Option<Value> {
        let input = match input {
            Some(Value::String(s)) if cx.string_encoded && s == "undefined" => None,
            other => other,
        };

        match input {
            None => {
                if self.required {
                    issues.push(Issue::mismatch(path, Reason::Required, self.expected(), None));
                }
                None
            }
            Some(Value::Null) if self.nullable => Some(Value::Null),
            Some(Value::Null) => {
                if self.required {
                    issues.push(Issue::mismatch(path, Reason::Required, self.expected(), Some(&Value::Null)));
                }
                None
            }
            Some(value) => self.check(value, cx, path, issues),
        }
    }

    /// The rule alone, for a present non-null value.
    fn check(
        &self,
        value: &Value,
        cx: &ApplyContext<'_>,
        path: &mut FieldPath,
        issues: &mut Vec<Issue>,
    ) -> Option<Value> {
        match &self.rule {
            Rule::Accept(_) => Some(value.clone()),
            Rule::String(rule) => rule.check(value, path, issues),
            Rule::Number(rule) => rule.check(value, path, issues),
            Rule::Boolean => match coerce::to_bool(value) {
                Ok(b) => Some(Value::Bool(b)),
                Err(reason) => {
                    issues.push(Issue::mismatch(path, reason, "boolean", Some(value)));
                    None
                }
            },
            Rule::Enum(values) => match value.as_str() {
                Some(s) if values.iter().any(|v| v == s) => Some(value.clone()),
                _ => {
                    issues.push(Issue::mismatch(path, Reason::InvalidEnumValue, self.expected(), Some(value)));
                    None
                }
            },
            Rule::Union(branches) => {
                for branch in branches {
                    let mut scratch = Vec::new();
                    let out = branch.apply(Some(value), cx, path, &mut scratch);
                    if scratch.is_empty() {
                        return out;
                    }
                }
                issues.push(Issue::mismatch(path, Reason::NoMatchingBranch, self.expected(), Some(value)));
                None
            }
            Rule::Array {
                element,
                min_items,
                max_items,
            } => check_array(self, element, *min_items, *max_items, value, cx, path, issues),
            Rule::Object(fields) => {
                let Value::Object(map) = value else {
                    issues.push(Issue::mismatch(path, Reason::InvalidType, "object", Some(value)));
                    return None;
                };
                let mut out: Map<String, Value> = map.clone();
                for (name, field) in fields {
                    path.push(name.as_str());
                    match field.apply(map.get(name), cx, path, issues) {
                        Some(coerced) => {
                            out.insert(name.clone(), coerced);
                        }
                        None => {
                            out.remove(name);
                        }
                    }
                    path.pop();
                }
                Some(Value::Object(out))
            }
            Rule::Named(name) => match cx.cache.get(name) {
                Some(root) => root.check(value, cx, path, issues),
                None => {
                    issues.push(Issue::mismatch(path, Reason::UnresolvedType, name.as_str(), Some(value)));
                    None
                }
            },
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn check_array(
    array: &Validator,
    element: &Validator,
    min_items: Option<usize>,
    max_items: Option<usize>,
    value: &Value,
    cx: &ApplyContext<'_>,
    path: &mut FieldPath,
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    let wrapped;
    let items: &[Value] = match value {
        Value::Array(items) => items,
        Value::Object(_) => {
            issues.push(Issue::mismatch(path, Reason::InvalidType, array.expected(), Some(value)));
            return None;
        }
        scalar if cx.string_encoded => {
            wrapped = [scalar.clone()];
            &wrapped
        }
        other => {
            issues.push(Issue::mismatch(path, Reason::InvalidType, array.expected(), Some(other)));
            return None;
        }
    };

    let count = items.len();
    if let Some(min) = min_items.filter(|min| count < *min) {
        issues.push(Issue::constraint(
            path,
            Reason::TooFewItems,
            format!("at least {min} items"),
            value,
            format!("must contain at least {min} items, found {count}"),
        ));
    }
    if let Some(max) = max_items.filter(|max| count > *max) {
        issues.push(Issue::constraint(
            path,
            Reason::TooManyItems,
            format!("at most {max} items"),
            value,
            format!("must contain at most {max} items, found {count}"),
        ));
    }

    let mut out = Vec::with_capacity(count);
    for (index, item) in items.iter().enumerate() {
        path.push(index);
        out.push(element.apply(Some(item), cx, path, issues).unwrap_or(Value::Null));
        path.pop();
    }
    Some(Value::Array(out))
}

impl StringRule {
    fn check(&self, value: &Value, path: &FieldPath, issues: &mut Vec<Issue>) -> Option<Value> {
        let expected = self.format.keyword().unwrap_or("string");

        let formatted = match self.format {
            Format::DateTime => coerce::date_time(value),
            _ => match coerce::to_string(value) {
                Ok(text) => match self.format {
                    Format::Date => coerce::date(&text),
                    Format::Email => coerce::email(&text),
                    Format::Url => coerce::url(&text),
                    Format::Uuid => coerce::uuid(&text),
                    Format::None | Format::DateTime => Ok(text),
                },
                Err(reason) => Err(reason),
            },
        };
        let text = match formatted {
            Ok(text) => text,
            Err(reason) => {
                issues.push(Issue::mismatch(path, reason, expected, Some(value)));
                return None;
            }
        };

        let before = issues.len();
        let length = text.chars().count();
        if let Some(min) = self.min_length.filter(|min| length < *min) {
            issues.push(Issue::constraint(
                path,
                Reason::TooShort,
                format!("{expected} of at least {min} characters"),
                value,
                format!("must contain at least {min} characters"),
            ));
        }
        if let Some(max) = self.max_length.filter(|max| length > *max) {
            issues.push(Issue::constraint(
                path,
                Reason::TooLong,
                format!("{expected} of at most {max} characters"),
                value,
                format!("must contain at most {max} characters"),
            ));
        }
        if let Some((regex, source)) = &self.pattern {
            if !regex.is_match(&text) {
                issues.push(Issue::constraint(
                    path,
                    Reason::PatternMismatch,
                    format!("match of {source}"),
                    value,
                    format!("must match pattern {source}"),
                ));
            }
        }

        (issues.len() == before).then_some(Value::String(text))
    }
}

impl NumberRule {
    fn check(&self, value: &Value, path: &FieldPath, issues: &mut Vec<Issue>) -> Option<Value> {
        let expected = if self.integer { "integer" } else { "number" };
        let coerced = match coerce::to_number(value, self.integer) {
            Ok(n) => n,
            Err(reason) => {
                issues.push(Issue::mismatch(path, reason, expected, Some(value)));
                return None;
            }
        };
        let n = coerced.as_f64()?;

        let before = issues.len();
        if let Some(min) = self.minimum.filter(|min| n < *min) {
            let bound = format_bound(min);
            issues.push(Issue::constraint(
                path,
                Reason::TooSmall,
                format!("{expected} >= {bound}"),
                value,
                format!("must be greater than or equal to {bound}"),
            ));
        }
        if let Some(max) = self.maximum.filter(|max| n > *max) {
            let bound = format_bound(max);
            issues.push(Issue::constraint(
                path,
                Reason::TooBig,
                format!("{expected} <= {bound}"),
                value,
                format!("must be less than or equal to {bound}"),
            ));
        }

        (issues.len() == before).then_some(coerced)
    }
}

fn format_bound(bound: f64) -> String {
    if bound.fract() == 0.0 && bound.abs() < 1e15 {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(rule: Rule) -> Validator {
        Validator {
            required: true,
            nullable: false,
            rule,
        }
    }

    fn run(validator: &Validator, value: Option<Value>, string_encoded: bool) -> (Option<Value>, Vec<Issue>) {
        let cache = ValidatorCache::new();
        let cx = ApplyContext {
            cache: &cache,
            string_encoded,
        };
        let mut path = FieldPath::root();
        let mut issues = Vec::new();
        let out = validator.apply(value.as_ref(), &cx, &mut path, &mut issues);
        (out, issues)
    }

    fn number(minimum: Option<f64>, maximum: Option<f64>) -> Validator {
        leaf(Rule::Number(NumberRule {
            integer: false,
            minimum,
            maximum,
        }))
    }

    #[test]
    fn presence_table() {
        let mut v = number(None, None);
        assert_eq!(run(&v, None, false).1[0].code, Reason::Required);
        assert_eq!(run(&v, Some(Value::Null), false).1[0].code, Reason::Required);

        v.nullable = true;
        assert_eq!(run(&v, Some(Value::Null), false), (Some(Value::Null), vec![]));
        assert_eq!(run(&v, None, false).1[0].code, Reason::Required);

        v.required = false;
        v.nullable = false;
        assert_eq!(run(&v, None, false), (None, vec![]));
        assert_eq!(run(&v, Some(Value::Null), false), (None, vec![]));
    }

    #[test]
    fn undefined_string_is_absent_on_string_channels() {
        let v = number(None, None);
        let (_, issues) = run(&v, Some(json!("undefined")), true);
        assert_eq!(issues[0].code, Reason::Required);
        let (_, issues) = run(&v, Some(json!("undefined")), false);
        assert_eq!(issues[0].code, Reason::InvalidType);
    }

    #[test]
    fn range_is_inclusive() {
        let v = number(Some(-3.0), Some(23.0));
        assert!(run(&v, Some(json!(-3)), false).1.is_empty());
        assert!(run(&v, Some(json!(23)), false).1.is_empty());
        assert_eq!(run(&v, Some(json!(-4)), false).1[0].code, Reason::TooSmall);
        let (_, issues) = run(&v, Some(json!("24")), false);
        assert_eq!(issues[0].code, Reason::TooBig);
        assert_eq!(issues[0].message, "must be less than or equal to 23");
    }

    #[test]
    fn string_length_and_pattern_reported_together() {
        let v = leaf(Rule::String(StringRule {
            format: Format::None,
            min_length: Some(1),
            max_length: Some(3),
            pattern: Some((coerce::full_match("[a-z]+").unwrap(), "[a-z]+".to_string())),
        }));
        let (out, issues) = run(&v, Some(json!("ABCD")), false);
        assert!(out.is_none());
        let codes: Vec<Reason> = issues.iter().map(|i| i.code).collect();
        assert_eq!(codes, vec![Reason::TooLong, Reason::PatternMismatch]);
    }

    #[test]
    fn string_coerces_scalars() {
        let v = leaf(Rule::String(StringRule {
            format: Format::None,
            min_length: None,
            max_length: None,
            pattern: None,
        }));
        assert_eq!(run(&v, Some(json!(42)), false).0, Some(json!("42")));
        assert_eq!(run(&v, Some(json!({})), false).1[0].code, Reason::InvalidType);
    }

    #[test]
    fn array_reports_every_failing_index() {
        let v = leaf(Rule::Array {
            element: Box::new(number(None, None)),
            min_items: None,
            max_items: None,
        });
        let (_, issues) = run(&v, Some(json!(["1", "x", 3, "y"])), false);
        let paths: Vec<String> = issues.iter().map(|i| i.path.to_string()).collect();
        assert_eq!(paths, vec!["[1]", "[3]"]);
    }

    #[test]
    fn scalar_wrapped_on_string_channels_only() {
        let v = leaf(Rule::Array {
            element: Box::new(number(None, None)),
            min_items: None,
            max_items: None,
        });
        assert_eq!(run(&v, Some(json!("7")), true).0, Some(json!([7])));
        assert_eq!(run(&v, Some(json!("7")), false).1[0].code, Reason::InvalidType);
    }

    #[test]
    fn item_count_bounds() {
        let v = leaf(Rule::Array {
            element: Box::new(number(None, None)),
            min_items: Some(2),
            max_items: Some(3),
        });
        assert_eq!(run(&v, Some(json!([1])), false).1[0].code, Reason::TooFewItems);
        assert_eq!(run(&v, Some(json!([1, 2, 3, 4])), false).1[0].code, Reason::TooManyItems);
        assert!(run(&v, Some(json!([1, 2])), false).1.is_empty());
    }

    #[test]
    fn object_passes_unknown_fields_through() {
        let mut fields = BTreeMap::new();
        fields.insert("n".to_string(), number(None, None));
        let v = leaf(Rule::Object(fields));
        let (out, issues) = run(&v, Some(json!({ "n": "5", "extra": true })), false);
        assert!(issues.is_empty());
        assert_eq!(out, Some(json!({ "n": 5, "extra": true })));
    }

    #[test]
    fn union_takes_first_accepting_branch() {
        let v = leaf(Rule::Union(vec![
            number(None, None),
            leaf(Rule::Boolean),
        ]));
        assert_eq!(run(&v, Some(json!("12")), false).0, Some(json!(12)));
        assert_eq!(run(&v, Some(json!(true)), false).0, Some(json!(true)));
        let (_, issues) = run(&v, Some(json!({})), false);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, Reason::NoMatchingBranch);
        assert_eq!(issues[0].expected, "number | boolean");
    }

    #[test]
    fn enum_membership() {
        let v = leaf(Rule::Enum(vec!["admin".to_string(), "user".to_string()]));
        assert!(run(&v, Some(json!("admin")), false).1.is_empty());
        let (_, issues) = run(&v, Some(json!("root")), false);
        assert_eq!(issues[0].code, Reason::InvalidEnumValue);
        assert_eq!(issues[0].expected, "'admin' | 'user'");
    }

    #[test]
    fn missing_named_validator_is_reported() {
        let v = leaf(Rule::Named(TypeName::new("Ghost").unwrap()));
        assert_eq!(run(&v, Some(json!({})), false).1[0].code, Reason::UnresolvedType);
    }

    #[test]
    fn bounds_format_without_trailing_zero() {
        assert_eq!(format_bound(23.0), "23");
        assert_eq!(format_bound(-3.0), "-3");
        assert_eq!(format_bound(0.5), "0.5");
    }
}
