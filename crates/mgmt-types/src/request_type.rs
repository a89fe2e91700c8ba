//! Management operation kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of management operation carried by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    /// Read one or more attributes.
    Read,
    /// Write a single attribute.
    Write,
    /// Invoke an operation.
    Exec,
    /// Describe the attributes and operations of the directory.
    List,
    /// Report gateway and protocol versions.
    Version,
    /// Find resource names matching a pattern.
    Search,
}

impl RequestType {
    /// Every request type, in protocol order.
    pub const ALL: [Self; 6] = [
        Self::Read,
        Self::Write,
        Self::Exec,
        Self::List,
        Self::Version,
        Self::Search,
    ];

    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Exec => "exec",
            Self::List => "list",
            Self::Version => "version",
            Self::Search => "search",
        }
    }

    /// Returns `true` when the request must name an attribute or operation.
    #[must_use]
    pub const fn requires_member(self) -> bool {
        matches!(self, Self::Read | Self::Write | Self::Exec)
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when parsing a request type fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported request type: {0}")]
pub struct RequestTypeParseError(String);

impl FromStr for RequestType {
    type Err = RequestTypeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalised = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalised)
            .ok_or(RequestTypeParseError(normalised))
    }
}
