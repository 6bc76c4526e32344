//! # Check Subcommand
//!
//! Compiles every named type of the document, and every request-body and
//! response schema of its operations, so that dangling references,
//! metadata fields missing from the document and misplaced constraints are
//! reported before a server ever starts.

use anyhow::Result;
use clap::Args;

use crate::SchemaInputs;

/// Arguments for the `gate check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub inputs: SchemaInputs,
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 when every type and operation target compiles, 1 on a compile error.
/// Unreadable inputs are returned as errors.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let session = args.inputs.session()?;
    let store = session.store();
    tracing::info!(
        types = store.type_names().len(),
        operations = store.operations().len(),
        "loaded schema store"
    );

    match session.warm_up() {
        Ok(compiled) => {
            println!(
                "Types: {compiled} compiled, {} excluded; operations: {}",
                store.exclusions().len(),
                store.operations().len()
            );
            Ok(0)
        }
        Err(e) => {
            println!("FAIL: {e}");
            Ok(1)
        }
    }
}
