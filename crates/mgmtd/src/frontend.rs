//! JSON request processing in front of the pipeline.
//!
//! A body is either one request object or an array of them. Every element is
//! validated independently, so a malformed element yields a failure envelope
//! at its own position while the rest of the batch still executes. A single
//! object yields a single envelope.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use mgmt_types::ResponseEnvelope;

use crate::errors::GatewayError;
use crate::pipeline::{ExecutionPipeline, PIPELINE_TARGET};
use crate::request::ManagementRequest;

/// Decodes JSON bodies, runs them through the pipeline and encodes the
/// responses.
#[derive(Debug, Clone)]
pub struct JsonFrontend {
    pipeline: Arc<ExecutionPipeline>,
}

impl JsonFrontend {
    /// Wraps a shared pipeline.
    pub fn new(pipeline: Arc<ExecutionPipeline>) -> Self {
        Self { pipeline }
    }

    /// Returns the wrapped pipeline.
    pub fn pipeline(&self) -> &Arc<ExecutionPipeline> {
        &self.pipeline
    }

    /// Refuses clients the restrictor does not admit.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AccessDenied`] naming the client.
    pub fn check_client_access(&self, host: &str, address: &str) -> Result<(), GatewayError> {
        if self.pipeline.is_remote_access_allowed(host, address) {
            Ok(())
        } else {
            warn!(target: PIPELINE_TARGET, host, address, "client refused");
            Err(GatewayError::access_denied(format!(
                "client {host} ({address})"
            )))
        }
    }

    /// Handles a raw request body.
    ///
    /// Bodies that are not valid JSON produce a single failure envelope.
    ///
    /// # Errors
    ///
    /// Returns fatal [`GatewayError`]s raised by the pipeline.
    pub fn handle_body(&self, body: &[u8]) -> Result<Value, GatewayError> {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.handle_value(value),
            Err(error) => {
                let failure = GatewayError::malformed(format!("invalid JSON body: {error}"));
                encode(&self.pipeline.translate(&failure))
            }
        }
    }

    /// Handles an already decoded request body.
    ///
    /// # Errors
    ///
    /// Returns fatal [`GatewayError`]s raised by the pipeline.
    pub fn handle_value(&self, body: Value) -> Result<Value, GatewayError> {
        match body {
            Value::Array(elements) => {
                debug!(target: PIPELINE_TARGET, count = elements.len(), "bulk request");
                let responses = elements
                    .into_iter()
                    .map(|element| self.handle_element(element).and_then(|envelope| encode(&envelope)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(responses))
            }
            Value::Object(_) => encode(&self.handle_element(body)?),
            other => {
                let failure = GatewayError::malformed(format!(
                    "request body must be an object or an array, not {}",
                    json_kind(&other)
                ));
                encode(&self.pipeline.translate(&failure))
            }
        }
    }

    fn handle_element(&self, element: Value) -> Result<ResponseEnvelope, GatewayError> {
        match ManagementRequest::from_value(element) {
            Ok(request) => self.pipeline.execute_one(&request),
            Err(error) => Ok(self.pipeline.translate(&error)),
        }
    }

    /// Returns the aggregate result code of an encoded response: the highest
    /// status among its envelopes.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] when an envelope lacks a status.
    pub fn result_code(response: &Value) -> Result<u16, GatewayError> {
        match response {
            Value::Array(envelopes) => envelopes
                .iter()
                .map(status_of)
                .try_fold(0, |highest, status| status.map(|status| highest.max(status))),
            envelope => status_of(envelope),
        }
    }
}

fn status_of(envelope: &Value) -> Result<u16, GatewayError> {
    envelope
        .get("status")
        .and_then(Value::as_u64)
        .and_then(|status| u16::try_from(status).ok())
        .ok_or_else(|| GatewayError::internal("response envelope carries no status"))
}

fn encode(envelope: &ResponseEnvelope) -> Result<Value, GatewayError> {
    serde_json::to_value(envelope).map_err(|error| GatewayError::internal(error.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
