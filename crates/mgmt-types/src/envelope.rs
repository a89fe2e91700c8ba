//! Response envelope shared by every request type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status code carried by successful envelopes.
pub const STATUS_OK: u16 = 200;

/// Uniform success/failure wrapper for the outcome of one request.
///
/// Every envelope carries a status. Failure envelopes additionally carry the
/// error message and type, and optionally a stack trace when the gateway runs
/// in debug mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    /// Result of the operation; `null` for failures.
    #[serde(default)]
    pub value: Value,
    /// Status code; [`STATUS_OK`] signals success.
    pub status: u16,
    /// Seconds since the Unix epoch at which the result was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    /// Previously recorded values for the same history key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Value>,
    /// Human-readable error message for failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stable error classification for failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Textual error chain, present only in debug mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<String>,
}

impl ResponseEnvelope {
    /// Builds a successful envelope around `value`.
    #[must_use]
    pub fn success(value: Value) -> Self {
        Self::with_status(value, STATUS_OK)
    }

    /// Builds an envelope with an explicit status and no error details.
    #[must_use]
    pub fn with_status(value: Value, status: u16) -> Self {
        Self {
            value,
            status,
            timestamp: None,
            history: None,
            error: None,
            error_type: None,
            stacktrace: None,
        }
    }

    /// Builds a failure envelope.
    #[must_use]
    pub fn failure(
        status: u16,
        error_type: impl Into<String>,
        message: impl Into<String>,
        stacktrace: Option<String>,
    ) -> Self {
        Self {
            value: Value::Null,
            status,
            timestamp: None,
            history: None,
            error: Some(message.into()),
            error_type: Some(error_type.into()),
            stacktrace,
        }
    }

    /// Returns `true` when the status signals success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}
