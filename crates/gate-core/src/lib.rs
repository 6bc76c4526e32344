#![deny(missing_docs)]

//! # gate-core: Foundational Types for openapi-gate
//!
//! This crate defines the identifiers every other crate in the workspace
//! shares. It has no internal crate dependencies: only `serde`,
//! `serde_json` and `thiserror` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for schema identifiers.** A [`TypeName`] is validated
//!    at construction and is the only key accepted by the schema store, so a
//!    raw `$ref` string can never be used as a lookup key by accident.
//!
//! 2. **Closed set of channels.** [`Channel`] names the four places a value
//!    can come from. Violation reports are always tagged with one of them.
//!
//! 3. **Structured paths.** [`FieldPath`] keeps object keys and array indices
//!    apart so reports can be rendered as `a.b[2]` for humans and as
//!    `["a", "b", 2]` on the wire.

pub mod channel;
pub mod error;
pub mod name;
pub mod path;

pub use channel::Channel;
pub use error::CoreError;
pub use name::{TypeName, COMPONENTS_PREFIX};
pub use path::{FieldPath, PathSegment};
