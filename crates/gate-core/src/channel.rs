//! # Validation Channels
//!
//! The origin of a value being validated. Each channel gets its own
//! violation report: a bad path parameter and a bad response body are
//! different failures and are never merged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where a validated value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Path parameters of the request URL.
    Path,
    /// Query-string parameters.
    Query,
    /// Request body.
    Body,
    /// Response payload produced by a handler.
    Response,
}

impl Channel {
    /// All channels, in request-processing order.
    pub const ALL: [Channel; 4] = [Channel::Path, Channel::Query, Channel::Body, Channel::Response];

    /// Wire name of the channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Body => "body",
            Self::Response => "response",
        }
    }

    /// Whether values on this channel arrive as URL-encoded strings.
    ///
    /// String-encoded channels get the query-string conventions: a lone
    /// scalar where an array is expected is wrapped, and the literal
    /// `"undefined"` counts as absent.
    pub fn is_string_encoded(&self) -> bool {
        matches!(self, Self::Path | Self::Query)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path" | "param" => Ok(Self::Path),
            "query" => Ok(Self::Query),
            "body" => Ok(Self::Body),
            "response" => Ok(Self::Response),
            other => Err(format!(
                "unknown channel \"{other}\" (expected path, query, body or response)"
            )),
        }
    }
}
