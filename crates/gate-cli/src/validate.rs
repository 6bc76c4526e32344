//! # Validate Subcommand
//!
//! Validates one value file against a named type, as if it had arrived on
//! the given channel. Prints the coerced value as JSON on success and the
//! violation report otherwise.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use gate_core::{Channel, TypeName};
use gate_schema::{SessionError, SourceFormat};

use crate::SchemaInputs;

/// Arguments for the `gate validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub inputs: SchemaInputs,

    /// Type to validate against.
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub type_name: String,

    /// Channel the value is treated as coming from: path, query, body or response.
    #[arg(long, short = 'c', default_value = "body")]
    pub channel: Channel,

    /// Value file (JSON, or YAML by extension).
    #[arg(value_name = "FILE")]
    pub value: PathBuf,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when the value is valid, 1 when it is rejected or
/// the type does not compile.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let session = args.inputs.session()?;
    let name = TypeName::new(args.type_name.as_str()).with_context(|| format!("--type {}", args.type_name))?;

    let content = std::fs::read_to_string(&args.value)
        .with_context(|| format!("reading {}", args.value.display()))?;
    let origin = args.value.display().to_string();
    let value = SourceFormat::from_path(&args.value).parse(&content, &origin)?;

    match session.validate_named(&value, &name, args.channel) {
        Ok(coerced) => {
            println!("{}", serde_json::to_string_pretty(&coerced)?);
            Ok(0)
        }
        Err(SessionError::Rejected(report)) => {
            println!("{report}");
            Ok(1)
        }
        Err(SessionError::Compile(e)) => {
            println!("FAIL: {e}");
            Ok(1)
        }
    }
}
