use serde_json::Value;

use crate::errors::TransportError;

/// Carries an encoded request body to the gateway and returns the decoded
/// response body.
///
/// Implementations own connection handling; the client never retries.
pub trait Transport: Send + Sync {
    /// Sends `body` and returns the gateway's JSON answer.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the gateway cannot be reached or its
    /// answer is not JSON.
    fn send(&self, body: &Value) -> Result<Value, TransportError>;
}
