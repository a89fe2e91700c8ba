//! Request shapes as they appear on the wire.
//!
//! These types are deliberately loose: the resource name is kept as text and
//! every member field is optional, so a malformed element inside a bulk
//! request can be reported at its own position instead of failing the whole
//! batch during decoding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::RequestType;

/// Attribute selection for read and write requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeSelector {
    /// A single attribute name.
    Single(String),
    /// Several attribute names read in one request.
    Multiple(Vec<String>),
}

impl AttributeSelector {
    /// Returns the selected names in request order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        match self {
            Self::Single(name) => vec![name.clone()],
            Self::Multiple(names) => names.clone(),
        }
    }
}

/// Remote directory descriptor for proxied requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireTarget {
    /// Service address of the remote directory.
    pub url: String,
    /// Optional user for authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Optional password for authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Additional connection options passed to the connector.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

/// A single management request as encoded on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
    /// Operation kind.
    #[serde(rename = "type")]
    pub request_type: RequestType,
    /// Textual resource name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Attribute name or names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributeSelector>,
    /// Operation name for exec requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Slash-separated descent into a compound value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// New value for writes or parameters for exec requests.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<Value>,
    /// Remote directory to proxy the request to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<WireTarget>,
}

impl WireRequest {
    /// Builds a bare request of the given type.
    #[must_use]
    pub fn new(request_type: RequestType) -> Self {
        Self {
            request_type,
            resource: None,
            attribute: None,
            operation: None,
            path: None,
            arguments: Vec::new(),
            target: None,
        }
    }
}
