//! Tests for the `gate check` and `gate validate` subcommands, run against
//! documents written to a temporary directory.

use std::path::{Path, PathBuf};

use gate_cli::check::{run_check, CheckArgs};
use gate_cli::validate::{run_validate, ValidateArgs};
use gate_cli::SchemaInputs;
use gate_core::Channel;

const DOCUMENT: &str = r#"
openapi: 3.0.3
components:
  schemas:
    Search:
      type: object
      properties:
        term:
          type: string
          minLength: 2
        page:
          type: integer
          minimum: 1
        tags:
          type: array
          items:
            type: string
      required: [term]
    Legacy:
      type: object
      properties:
        blob:
          $ref: '#/components/schemas/Missing'
"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn inputs(dir: &Path, exclude: &[&str]) -> SchemaInputs {
    SchemaInputs {
        document: write(dir, "openapi.yaml", DOCUMENT),
        metadata: None,
        exclude: exclude.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn check_fails_on_dangling_reference() {
    let dir = tempfile::tempdir().unwrap();
    let args = CheckArgs {
        inputs: inputs(dir.path(), &[]),
    };
    assert_eq!(run_check(&args).unwrap(), 1);
}

#[test]
fn check_passes_with_exclusion() {
    let dir = tempfile::tempdir().unwrap();
    let args = CheckArgs {
        inputs: inputs(dir.path(), &["Legacy"]),
    };
    assert_eq!(run_check(&args).unwrap(), 0);
}

#[test]
fn check_reports_metadata_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let mut schema_inputs = inputs(dir.path(), &["Legacy"]);
    schema_inputs.metadata = Some(write(
        dir.path(),
        "fields.json",
        r#"{ "Search": { "term": { "type": "String" }, "sort": { "type": "String" } } }"#,
    ));
    let args = CheckArgs { inputs: schema_inputs };
    assert_eq!(run_check(&args).unwrap(), 1);
}

#[test]
fn check_fails_on_dangling_response_reference() {
    let dir = tempfile::tempdir().unwrap();
    let document = r#"
openapi: 3.0.3
paths:
  /search:
    get:
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/SearchResult'
components:
  schemas:
    Search:
      type: object
      properties:
        term:
          type: string
"#;
    let args = CheckArgs {
        inputs: SchemaInputs {
            document: write(dir.path(), "openapi.yaml", document),
            metadata: None,
            exclude: Vec::new(),
        },
    };
    assert_eq!(run_check(&args).unwrap(), 1);
}

#[test]
fn check_errors_on_missing_document() {
    let dir = tempfile::tempdir().unwrap();
    let args = CheckArgs {
        inputs: SchemaInputs {
            document: dir.path().join("absent.json"),
            metadata: None,
            exclude: Vec::new(),
        },
    };
    assert!(run_check(&args).is_err());
}

#[test]
fn validate_accepts_query_value() {
    let dir = tempfile::tempdir().unwrap();
    let value = write(dir.path(), "value.json", r#"{ "term": "rust", "page": "2", "tags": "cli" }"#);
    let args = ValidateArgs {
        inputs: inputs(dir.path(), &["Legacy"]),
        type_name: "Search".to_string(),
        channel: Channel::Query,
        value,
    };
    assert_eq!(run_validate(&args).unwrap(), 0);
}

#[test]
fn validate_rejects_on_body_channel() {
    let dir = tempfile::tempdir().unwrap();
    let value = write(dir.path(), "value.yaml", "term: r\npage: 0\n");
    let args = ValidateArgs {
        inputs: inputs(dir.path(), &["Legacy"]),
        type_name: "Search".to_string(),
        channel: Channel::Body,
        value,
    };
    assert_eq!(run_validate(&args).unwrap(), 1);
}

#[test]
fn validate_unknown_type_fails() {
    let dir = tempfile::tempdir().unwrap();
    let value = write(dir.path(), "value.json", "{}");
    let args = ValidateArgs {
        inputs: inputs(dir.path(), &[]),
        type_name: "Nope".to_string(),
        channel: Channel::Body,
        value,
    };
    assert_eq!(run_validate(&args).unwrap(), 1);
}

#[test]
fn validate_rejects_invalid_type_name() {
    let dir = tempfile::tempdir().unwrap();
    let value = write(dir.path(), "value.json", "{}");
    let args = ValidateArgs {
        inputs: inputs(dir.path(), &[]),
        type_name: "not a type".to_string(),
        channel: Channel::Body,
        value,
    };
    assert!(run_validate(&args).is_err());
}
