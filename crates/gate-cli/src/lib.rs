//! # gate-cli: CLI Tool for openapi-gate
//!
//! Provides the `gate` command-line interface.
//!
//! ## Subcommands
//!
//! - `gate check`: compile every type of a document; exits 1 on the first
//!   schema/metadata inconsistency.
//! - `gate validate`: validate a JSON or YAML value file against one type
//!   on a channel and print the coerced value or the violation report.
//!
//! ```bash
//! gate check --document openapi.yaml --metadata fields.json --exclude LegacyBlob
//! gate validate --document openapi.yaml --type UserQuery1 --channel query value.json
//! ```

pub mod check;
pub mod validate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use gate_core::TypeName;
use gate_schema::{MetadataTable, SchemaDocument, SchemaStore, ValidationSession};

/// Schema inputs shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct SchemaInputs {
    /// OpenAPI document (JSON, or YAML by `.yaml`/`.yml` extension).
    #[arg(long, short = 'd', value_name = "FILE")]
    pub document: PathBuf,

    /// Field-metadata table (JSON or YAML).
    #[arg(long, short = 'm', value_name = "FILE")]
    pub metadata: Option<PathBuf>,

    /// Type opted out of validation. Repeatable.
    #[arg(long = "exclude", short = 'x', value_name = "TYPE")]
    pub exclude: Vec<String>,
}

impl SchemaInputs {
    /// Load the document, metadata and exclusions into a store.
    pub fn load_store(&self) -> Result<SchemaStore> {
        let document = SchemaDocument::load(&self.document)
            .with_context(|| format!("loading schema document {}", self.document.display()))?;
        let mut builder = SchemaStore::builder().document(document);

        if let Some(path) = &self.metadata {
            let metadata = MetadataTable::load(path)
                .with_context(|| format!("loading field metadata {}", path.display()))?;
            builder = builder.metadata(metadata);
        }

        for name in &self.exclude {
            let name = TypeName::new(name.as_str()).with_context(|| format!("--exclude {name}"))?;
            builder = builder.exclude(name);
        }

        Ok(builder.build())
    }

    /// Load the store and open a session over it.
    pub fn session(&self) -> Result<ValidationSession> {
        Ok(ValidationSession::new(self.load_store()?))
    }
}
