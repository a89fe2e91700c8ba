//! Error types raised by the management client.

use std::error::Error as StdError;

use mgmt_types::WireRequest;
use thiserror::Error;

use crate::client::ClientResponse;

/// Failure raised by a [`Transport`](crate::Transport).
#[derive(Debug, Error)]
#[error("transport failed: {message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    /// Creates a transport error with an optional underlying cause.
    pub fn new(
        message: impl Into<String>,
        source: Option<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }

    /// Returns the failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A failure envelope returned by the gateway for one request.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("remote request failed with status {status}: {message}")]
pub struct RemoteError {
    /// Status carried by the envelope.
    pub status: u16,
    /// Error message carried by the envelope.
    pub message: String,
    /// Error classification, when the gateway supplied one.
    pub error_type: Option<String>,
    /// Error chain text, present when the gateway runs in debug mode.
    pub stacktrace: Option<String>,
    /// The request that failed, unless the failure applied to the whole body.
    pub request: Option<WireRequest>,
}

/// Result of one request inside a bulk call.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOutcome {
    /// The request succeeded.
    Success(ClientResponse),
    /// The gateway answered with a failure envelope.
    Failure(RemoteError),
}

impl BulkOutcome {
    /// Returns `true` for [`BulkOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the successful response, if any.
    #[must_use]
    pub fn response(&self) -> Option<&ClientResponse> {
        match self {
            Self::Success(response) => Some(response),
            Self::Failure(_) => None,
        }
    }

    /// Returns the remote failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }
}

/// A bulk call in which at least one request failed.
///
/// Holds every outcome at the position of its request.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} of {} bulk requests failed", self.errors().count(), self.outcomes.len())]
pub struct BulkRemoteError {
    outcomes: Vec<BulkOutcome>,
}

impl BulkRemoteError {
    pub(crate) fn new(outcomes: Vec<BulkOutcome>) -> Self {
        Self { outcomes }
    }

    /// Returns every outcome in request order.
    #[must_use]
    pub fn outcomes(&self) -> &[BulkOutcome] {
        &self.outcomes
    }

    /// Consumes the error, returning the outcomes.
    #[must_use]
    pub fn into_outcomes(self) -> Vec<BulkOutcome> {
        self.outcomes
    }

    /// Returns the successful responses in request order.
    pub fn responses(&self) -> impl Iterator<Item = &ClientResponse> {
        self.outcomes.iter().filter_map(BulkOutcome::response)
    }

    /// Returns the remote failures in request order.
    pub fn errors(&self) -> impl Iterator<Item = &RemoteError> {
        self.outcomes.iter().filter_map(BulkOutcome::error)
    }
}

/// Errors raised by [`ManagementClient`](crate::ManagementClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be encoded.
    #[error("failed to serialise request: {0}")]
    Serialise(#[source] serde_json::Error),
    /// The transport failed before a response arrived.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The response does not have the expected shape.
    #[error("malformed response: {message}")]
    MalformedResponse {
        /// What was wrong with the response.
        message: String,
    },
    /// The gateway answered a single request with a failure envelope.
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// At least one request of a bulk call failed.
    #[error(transparent)]
    Bulk(#[from] BulkRemoteError),
}

impl ClientError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }
}
