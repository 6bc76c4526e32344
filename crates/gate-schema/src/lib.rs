//! # gate-schema: Schema-to-Validator Compiler
//!
//! Compiles an OpenAPI schema document plus per-field metadata into
//! validators for path parameters, query parameters, request bodies and
//! responses.
//!
//! ## Pipeline
//!
//! ```text
//! SchemaDocument ─┐
//! MetadataTable ──┼─ SchemaStoreBuilder ─> SchemaStore
//! ExclusionSet ───┘                          │
//!                                            ▼
//!         value + Target + Channel ─> ValidationSession
//!                                            │ merge::lower_named
//!                                            ▼
//!                                        SchemaNode ─> Compiler ─> Validator (cached)
//!                                                                     │
//!                                  coerced value  <──────── ok ───────┤
//!                                  ViolationReport <────── issues ────┘
//! ```
//!
//! ## Error Classes
//!
//! - [`DocumentError`]: inputs could not be loaded. Raised at startup.
//! - [`CompileError`]: inputs disagree with each other. Raised when a
//!   type is first compiled; [`ValidationSession::warm_up`] forces this at
//!   startup.
//! - [`ViolationReport`]: a value does not satisfy its type. Per request.
//!
//! ## Crate Policy
//!
//! - Depends only on `gate-core` internally.
//! - No HTTP types. The web layer lives in `gate-api`.
//! - The store is immutable once built; the validator cache is the only
//!   shared mutable state and only ever gains entries.

mod coerce;
pub mod compiler;
pub mod document;
pub mod error;
pub mod exclusion;
pub mod merge;
pub mod metadata;
pub mod node;
pub mod operations;
pub mod report;
pub mod session;
pub mod store;
pub mod validator;

pub use compiler::{Compiler, ValidatorCache};
pub use document::{PropertySchema, SchemaDocument, SourceFormat};
pub use error::{CompileError, DocumentError};
pub use exclusion::ExclusionSet;
pub use metadata::{FieldMetadata, FieldShape, MetadataTable, ScalarType, TypeFields};
pub use node::{Field, Format, NodeKind, Primitive, PrimitiveKind, SchemaNode};
pub use operations::OperationIndex;
pub use report::{Issue, Reason, ViolationReport};
pub use session::{SessionError, Target, ValidationSession};
pub use store::{SchemaStore, SchemaStoreBuilder};
pub use validator::Validator;
