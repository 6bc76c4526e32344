//! # Validation Session
//!
//! Entry point for validating one value: resolve the target, compile (or
//! fetch) its validator, apply it, and either return the coerced value or a
//! [`ViolationReport`] tagged with the channel.
//!
//! A session is cheap to clone and safe to share across threads. The store
//! is immutable and the validator cache only ever gains entries.

use std::fmt;
use std::sync::Arc;

use gate_core::{Channel, FieldPath, TypeName};
use serde_json::Value;
use thiserror::Error;

use crate::compiler::{Compiler, ValidatorCache};
use crate::document::PropertySchema;
use crate::error::CompileError;
use crate::merge;
use crate::metadata::FieldShape;
use crate::report::ViolationReport;
use crate::store::SchemaStore;
use crate::validator::{ApplyContext, Validator};

/// What a value is validated against.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A named type of the store.
    Named(TypeName),
    /// An anonymous schema, e.g. an array response.
    Inline(Box<PropertySchema>),
}

impl Target {
    /// A schema that is just a resolvable `$ref` becomes [`Target::Named`];
    /// everything else stays inline.
    pub fn from_schema(schema: PropertySchema) -> Self {
        let named = schema
            .reference
            .as_deref()
            .and_then(|r| TypeName::from_reference(r).ok());
        match named {
            Some(name) if schema.items.is_none() && schema.properties.is_none() => Self::Named(name),
            _ => Self::Inline(Box::new(schema)),
        }
    }

    /// The type name of a named target.
    pub fn type_name(&self) -> Option<&TypeName> {
        match self {
            Self::Named(name) => Some(name),
            Self::Inline(_) => None,
        }
    }
}

impl From<TypeName> for Target {
    fn from(name: TypeName) -> Self {
        Self::Named(name)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::Inline(_) => f.write_str("inline schema"),
        }
    }
}

/// Outcome of a failed [`ValidationSession::validate`].
#[derive(Error, Debug)]
pub enum SessionError {
    /// The value does not satisfy the target. Recoverable per request.
    #[error("{0}")]
    Rejected(ViolationReport),

    /// The target could not be compiled. An authoring mistake.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
}

/// Validates values against a schema store.
#[derive(Debug, Clone)]
pub struct ValidationSession {
    store: Arc<SchemaStore>,
    cache: Arc<ValidatorCache>,
}

impl ValidationSession {
    /// Session over `store` with an empty validator cache.
    pub fn new(store: SchemaStore) -> Self {
        Self::shared(Arc::new(store))
    }

    /// Session over an already shared store.
    pub fn shared(store: Arc<SchemaStore>) -> Self {
        Self {
            store,
            cache: Arc::new(ValidatorCache::new()),
        }
    }

    /// The store.
    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    /// The validator cache.
    pub fn cache(&self) -> &ValidatorCache {
        &self.cache
    }

    /// Validator of `name`, compiled on first use.
    pub fn compiled(&self, name: &TypeName) -> Result<Arc<Validator>, CompileError> {
        Compiler::new(&self.store, &self.cache).compile_named(name)
    }

    /// Compile every type the store knows, excluded ones aside, then every
    /// request-body and response target of the document's operations.
    /// Returns the number of types compiled.
    ///
    /// # Errors
    ///
    /// The first [`CompileError`], types in name order before operations.
    pub fn warm_up(&self) -> Result<usize, CompileError> {
        let mut compiled = 0;
        for name in self.store.type_names() {
            if self.store.is_excluded(&name) {
                continue;
            }
            self.compiled(&name)?;
            compiled += 1;
        }

        let targets = self.store.operations().targets();
        for (operation, target) in &targets {
            self.validator_for(target, operation)?;
        }

        tracing::info!(
            types = compiled,
            operation_targets = targets.len(),
            excluded = self.store.exclusions().len(),
            "validators compiled"
        );
        Ok(compiled)
    }

    /// Validate `value` against `target` as it arrived on `channel`.
    ///
    /// # Errors
    ///
    /// [`SessionError::Rejected`] with every failing field, or
    /// [`SessionError::Compile`] if the target does not compile.
    pub fn validate(&self, value: &Value, target: &Target, channel: Channel) -> Result<Value, SessionError> {
        let validator = self.validator_for(target, &format!("({channel} schema)"))?;

        let cx = ApplyContext {
            cache: &self.cache,
            string_encoded: channel.is_string_encoded(),
        };
        let mut path = FieldPath::root();
        let mut issues = Vec::new();
        let output = validator.apply(Some(value), &cx, &mut path, &mut issues);

        if issues.is_empty() {
            return Ok(output.unwrap_or(Value::Null));
        }

        let report = ViolationReport::new(channel, target.to_string(), issues);
        tracing::debug!(
            channel = %channel,
            target = %target,
            issues = report.len(),
            "validation rejected"
        );
        Err(SessionError::Rejected(report))
    }

    fn validator_for(&self, target: &Target, location: &str) -> Result<Arc<Validator>, CompileError> {
        match target {
            Target::Named(name) => self.compiled(name),
            Target::Inline(schema) => {
                let node = merge::lower_schema(schema, &FieldShape::Unspecified, location)?;
                let validator = Compiler::new(&self.store, &self.cache).compile_inline(&node, location)?;
                Ok(Arc::new(validator))
            }
        }
    }

    /// Shorthand for [`validate`](Self::validate) with a named target.
    pub fn validate_named(&self, value: &Value, name: &TypeName, channel: Channel) -> Result<Value, SessionError> {
        self.validate(value, &Target::Named(name.clone()), channel)
    }
}
