//! # Schema Bootstrap
//!
//! Builds the validation session at startup and installs it in the
//! [`SchemaGate`].
//!
//! ## Bootstrap Sequence
//!
//! 1. **Load Schema Document**: `GATE_SCHEMA_DOCUMENT`, or the built-in
//!    utoipa document of this crate.
//! 2. **Load Field Metadata**: `GATE_FIELD_METADATA`, if set.
//! 3. **Register Exclusions**: `GATE_EXCLUDE`, plus the built-in
//!    exclusions when the built-in document is used.
//! 4. **Warm Up**: compile every type so schema/metadata mismatches abort
//!    startup instead of surfacing on the first request.
//! 5. **Install**: fill the gate; requests stop getting 503.
//!
//! Loading runs on a blocking task while the server already accepts
//! connections.

use gate_core::{CoreError, TypeName};
use gate_schema::{CompileError, DocumentError, MetadataTable, SchemaDocument, SchemaStore, ValidationSession};
use tokio::task::JoinHandle;

use crate::openapi;
use crate::state::{AppConfig, SchemaGate};

/// Errors during schema bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The schema document or metadata table could not be loaded.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A type failed to compile during warm-up.
    #[error("schema warm-up failed: {0}")]
    Compile(#[from] CompileError),

    /// An exclusion is not a valid type name.
    #[error("invalid exclusion '{name}': {source}")]
    InvalidExclusion {
        name: String,
        #[source]
        source: CoreError,
    },

    /// The built-in document could not be serialized.
    #[error("built-in OpenAPI document: {0}")]
    BuiltinDocument(#[from] serde_json::Error),
}

/// Assemble the schema store described by `config`.
pub fn load_store(config: &AppConfig) -> Result<SchemaStore, BootstrapError> {
    let mut builder = SchemaStore::builder();

    let document = match &config.schema_document {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading schema document");
            SchemaDocument::load(path)?
        }
        None => {
            tracing::info!("using built-in schema document");
            builder = builder.exclude_all(builtin_exclusions()?);
            SchemaDocument::from_value(&openapi::document()?)?
        }
    };
    builder = builder.document(document);

    if let Some(path) = &config.field_metadata {
        tracing::info!(path = %path.display(), "loading field metadata");
        builder = builder.metadata(MetadataTable::load(path)?);
    }

    for name in &config.exclude {
        let type_name = TypeName::new(name.as_str()).map_err(|source| BootstrapError::InvalidExclusion {
            name: name.clone(),
            source,
        })?;
        builder = builder.exclude(type_name);
    }

    Ok(builder.build())
}

/// Load the store and compile every type.
pub fn build_session(config: &AppConfig) -> Result<ValidationSession, BootstrapError> {
    let session = ValidationSession::new(load_store(config)?);
    session.warm_up()?;
    Ok(session)
}

/// Build the session on a blocking task and install it in `gate`.
///
/// Resolves to the number of compiled types. On error the gate stays empty.
pub fn spawn_loader(config: AppConfig, gate: SchemaGate) -> JoinHandle<Result<usize, BootstrapError>> {
    tokio::task::spawn_blocking(move || {
        let session = build_session(&config).map_err(|e| {
            tracing::error!(error = %e, "schema bootstrap failed");
            e
        })?;
        let types = session.cache().len();
        gate.install(session);
        tracing::info!(types, "schema gate ready");
        Ok(types)
    })
}

fn builtin_exclusions() -> Result<Vec<TypeName>, BootstrapError> {
    openapi::BUILTIN_EXCLUSIONS
        .iter()
        .map(|name| {
            TypeName::new(*name).map_err(|source| BootstrapError::InvalidExclusion {
                name: (*name).to_string(),
                source,
            })
        })
        .collect()
}
