//! # API Route Modules
//!
//! - `users`: demo resource whose DTOs are validated on every channel:
//!   path (`ValidatedPath`), query (`ValidatedQuery`), body
//!   (`ValidatedJson`) and response (the response validation middleware).

pub mod users;
