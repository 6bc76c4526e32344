//! # Middleware
//!
//! - `response_validation`: validates JSON responses against the
//!   operation's documented response schema on the `response` channel.
//! - `tracing_layer`: request/response tracing spans.

pub mod response_validation;
pub mod tracing_layer;
