//! Request execution and response reconstruction.

use serde_json::Value;

use mgmt_types::{ResponseEnvelope, STATUS_OK, WireRequest};

use crate::errors::{BulkOutcome, BulkRemoteError, ClientError, RemoteError};
use crate::request::ClientRequest;
use crate::transport::Transport;

/// A successful response paired with the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientResponse {
    /// The request as it was sent.
    pub request: WireRequest,
    /// The returned value.
    pub value: Value,
    /// Seconds since the Unix epoch at which the gateway recorded the value.
    pub timestamp: Option<u64>,
    /// Earlier values, when the gateway tracks history for the request.
    pub history: Option<Value>,
}

/// Executes requests against a gateway through a [`Transport`].
#[derive(Debug, Clone)]
pub struct ManagementClient<T> {
    transport: T,
}

impl<T: Transport> ManagementClient<T> {
    /// Creates a client sending through `transport`.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Executes a single request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Remote`] when the gateway answers with a
    /// failure envelope, and transport or shape errors otherwise.
    pub fn execute(&self, request: &ClientRequest) -> Result<ClientResponse, ClientError> {
        let body = serde_json::to_value(request.as_wire()).map_err(ClientError::Serialise)?;
        let response = self.transport.send(&body)?;
        if !response.is_object() {
            return Err(ClientError::malformed(format!(
                "expected a response object but got {}",
                kind_of(&response)
            )));
        }
        match outcome(request.as_wire(), response)? {
            BulkOutcome::Success(response) => Ok(response),
            BulkOutcome::Failure(error) => Err(ClientError::Remote(error)),
        }
    }

    /// Executes several requests in one round trip.
    ///
    /// Responses come back in request order.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Bulk`] holding every outcome when any request
    /// failed, [`ClientError::Remote`] when the gateway rejected the whole
    /// body, and transport or shape errors otherwise.
    pub fn execute_bulk(
        &self,
        requests: &[ClientRequest],
    ) -> Result<Vec<ClientResponse>, ClientError> {
        let wire: Vec<WireRequest> = requests
            .iter()
            .map(|request| request.as_wire().clone())
            .collect();
        let body = serde_json::to_value(&wire).map_err(ClientError::Serialise)?;
        let response = self.transport.send(&body)?;
        let outcomes = reconstruct(&wire, response)?;

        if outcomes.iter().all(BulkOutcome::is_success) {
            Ok(outcomes
                .into_iter()
                .filter_map(|outcome| match outcome {
                    BulkOutcome::Success(response) => Some(response),
                    BulkOutcome::Failure(_) => None,
                })
                .collect())
        } else {
            Err(ClientError::Bulk(BulkRemoteError::new(outcomes)))
        }
    }
}

/// Rebuilds one outcome per request from a bulk response.
///
/// An array response must hold one envelope object per request. A single
/// object answers a one-element bulk; with a non-200 status it is a failure
/// of the whole body and is returned as [`ClientError::Remote`].
///
/// # Errors
///
/// Returns [`ClientError::MalformedResponse`] when the response shape does not
/// fit the requests.
pub fn reconstruct(
    requests: &[WireRequest],
    response: Value,
) -> Result<Vec<BulkOutcome>, ClientError> {
    match response {
        Value::Array(envelopes) => {
            if envelopes.len() != requests.len() {
                return Err(ClientError::malformed(format!(
                    "expected {} envelopes but got {}",
                    requests.len(),
                    envelopes.len()
                )));
            }
            requests
                .iter()
                .zip(envelopes)
                .enumerate()
                .map(|(position, (request, envelope))| {
                    if envelope.is_object() {
                        outcome(request, envelope)
                    } else {
                        Err(ClientError::malformed(format!(
                            "response {position} is invalid: expected an object but got {}",
                            kind_of(&envelope)
                        )))
                    }
                })
                .collect()
        }
        Value::Object(_) => {
            let envelope = decode(response)?;
            if envelope.status != STATUS_OK {
                return Err(ClientError::Remote(remote_error(None, envelope)));
            }
            match requests {
                [request] => Ok(vec![success(request, envelope)]),
                _ => Err(ClientError::malformed(format!(
                    "expected an array of {} envelopes but got a single object",
                    requests.len()
                ))),
            }
        }
        other => Err(ClientError::malformed(format!(
            "expected an array or an object but got {}",
            kind_of(&other)
        ))),
    }
}

fn outcome(request: &WireRequest, envelope: Value) -> Result<BulkOutcome, ClientError> {
    let envelope = decode(envelope)?;
    if envelope.status == STATUS_OK {
        Ok(success(request, envelope))
    } else {
        Ok(BulkOutcome::Failure(remote_error(
            Some(request.clone()),
            envelope,
        )))
    }
}

fn decode(envelope: Value) -> Result<ResponseEnvelope, ClientError> {
    serde_json::from_value(envelope)
        .map_err(|error| ClientError::malformed(format!("invalid envelope: {error}")))
}

fn success(request: &WireRequest, envelope: ResponseEnvelope) -> BulkOutcome {
    BulkOutcome::Success(ClientResponse {
        request: request.clone(),
        value: envelope.value,
        timestamp: envelope.timestamp,
        history: envelope.history,
    })
}

fn remote_error(request: Option<WireRequest>, envelope: ResponseEnvelope) -> RemoteError {
    RemoteError {
        status: envelope.status,
        message: envelope
            .error
            .unwrap_or_else(|| format!("request failed with status {}", envelope.status)),
        error_type: envelope.error_type,
        stacktrace: envelope.stacktrace,
        request,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
