//! Property tests for required/optional handling, numeric coercion, bounds
//! and idempotence of validation output.

use gate_core::{Channel, TypeName};
use gate_schema::{Reason, SchemaDocument, SchemaStore, SessionError, ValidationSession};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn session() -> ValidationSession {
    let document = SchemaDocument::from_value(&json!({
        "openapi": "3.0.0",
        "components": {
            "schemas": {
                "Sample": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "minLength": 1, "maxLength": 10 },
                        "count": { "type": "number", "minimum": -3, "maximum": 23 },
                        "flag": { "type": "boolean" },
                        "note": { "type": "string" },
                        "score": { "type": "integer" },
                        "maybe": { "type": "string", "nullable": true }
                    },
                    "required": ["name", "count", "maybe"]
                }
            }
        }
    }))
    .expect("document parses");
    ValidationSession::new(SchemaStore::builder().document(document).build())
}

fn sample() -> TypeName {
    TypeName::new("Sample").unwrap()
}

fn valid_base() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("name".to_string(), json!("abc"));
    map.insert("count".to_string(), json!(1));
    map.insert("maybe".to_string(), Value::Null);
    map
}

fn codes_at(result: Result<Value, SessionError>, field: &str) -> Vec<Reason> {
    match result {
        Ok(_) => Vec::new(),
        Err(SessionError::Rejected(report)) => report
            .issues()
            .iter()
            .filter(|issue| issue.path.to_string() == field)
            .map(|issue| issue.code)
            .collect(),
        Err(SessionError::Compile(e)) => panic!("fixture failed to compile: {e}"),
    }
}

proptest! {
    #[test]
    fn omitting_optional_fields_always_succeeds(
        flag in proptest::option::of(any::<bool>()),
        note in proptest::option::of("[a-z]{0,12}"),
        score in proptest::option::of(-1000i64..1000),
    ) {
        let mut map = valid_base();
        if let Some(flag) = flag {
            map.insert("flag".to_string(), json!(flag));
        }
        if let Some(note) = note {
            map.insert("note".to_string(), json!(note));
        }
        if let Some(score) = score {
            map.insert("score".to_string(), json!(score));
        }
        let result = session().validate_named(&Value::Object(map), &sample(), Channel::Body);
        prop_assert!(result.is_ok());
    }

    #[test]
    fn omitting_a_required_field_always_fails_with_required(
        field in prop::sample::select(vec!["name", "count", "maybe"]),
        channel in prop::sample::select(Channel::ALL.to_vec()),
    ) {
        let mut map = valid_base();
        map.remove(field);
        let result = session().validate_named(&Value::Object(map), &sample(), channel);
        prop_assert_eq!(codes_at(result, field), vec![Reason::Required]);
    }

    #[test]
    fn null_is_rejected_unless_nullable(field in prop::sample::select(vec!["name", "count"])) {
        let mut map = valid_base();
        map.insert(field.to_string(), Value::Null);
        let result = session().validate_named(&Value::Object(map), &sample(), Channel::Body);
        prop_assert_eq!(codes_at(result, field), vec![Reason::Required]);
    }

    #[test]
    fn numeric_strings_coerce_to_numbers(n in -3i64..=23) {
        let mut map = valid_base();
        map.insert("count".to_string(), json!(n.to_string()));
        let out = session()
            .validate_named(&Value::Object(map), &sample(), Channel::Query)
            .unwrap();
        prop_assert_eq!(&out["count"], &json!(n));
    }

    #[test]
    fn alphabetic_strings_are_not_numbers(s in "[a-zA-Z]{1,8}") {
        let mut map = valid_base();
        map.insert("count".to_string(), json!(s));
        let result = session().validate_named(&Value::Object(map), &sample(), Channel::Query);
        prop_assert_eq!(codes_at(result, "count"), vec![Reason::InvalidType]);
    }

    #[test]
    fn numeric_range_is_inclusive(n in -100i64..100) {
        let mut map = valid_base();
        map.insert("count".to_string(), json!(n));
        let result = session().validate_named(&Value::Object(map), &sample(), Channel::Body);
        let codes = codes_at(result, "count");
        if (-3..=23).contains(&n) {
            prop_assert!(codes.is_empty());
        } else if n < -3 {
            prop_assert_eq!(codes, vec![Reason::TooSmall]);
        } else {
            prop_assert_eq!(codes, vec![Reason::TooBig]);
        }
    }

    #[test]
    fn string_length_is_inclusive(len in 0usize..20) {
        let mut map = valid_base();
        map.insert("name".to_string(), json!("x".repeat(len)));
        let result = session().validate_named(&Value::Object(map), &sample(), Channel::Body);
        let codes = codes_at(result, "name");
        match len {
            0 => prop_assert_eq!(codes, vec![Reason::TooShort]),
            1..=10 => prop_assert!(codes.is_empty()),
            _ => prop_assert_eq!(codes, vec![Reason::TooLong]),
        }
    }

    #[test]
    fn validation_is_idempotent(
        name in "[a-m]{1,10}",
        count in -3i64..=23,
        flag in prop::sample::select(vec!["true", "TRUE", "false", "False"]),
        score in -1000i64..1000,
        maybe in proptest::option::of("[a-z]{0,5}"),
    ) {
        let input = json!({
            "name": name,
            "count": count.to_string(),
            "flag": flag,
            "score": score.to_string(),
            "maybe": maybe,
            "extra": [1, 2, 3]
        });
        let session = session();
        let first = session.validate_named(&input, &sample(), Channel::Query).unwrap();
        let second = session.validate_named(&first, &sample(), Channel::Query).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first["extra"], &json!([1, 2, 3]));
    }
}
