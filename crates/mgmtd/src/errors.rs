//! Error types for request dispatch failures.
//!
//! [`GatewayError`] is the single taxonomy surfaced by handlers, dispatchers
//! and the pipeline. Each variant maps to a stable numeric status and a stable
//! error type name so the pipeline can translate failures into response
//! envelopes uniformly. Invariant violations (no dispatcher, no handler, bad
//! dispatcher configuration) are fatal and never translated.

use std::error::Error as StdError;
use std::fmt::Write as _;

use thiserror::Error;

use mgmt_types::RequestType;

use crate::directory::DirectoryError;

/// Boxed error used to carry underlying causes across collaborator seams.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors surfaced while executing management requests.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The access restrictor refused the request.
    #[error("access denied: {subject}")]
    AccessDenied { subject: String },

    /// The directory has no resource with the given name.
    #[error("resource not found: {resource}")]
    ResourceNotFound { resource: String },

    /// The resource exists but lacks the named attribute or operation.
    #[error("'{member}' not found on resource {resource}")]
    MemberNotFound { resource: String, member: String },

    /// The directory failed while reading, writing or invoking.
    #[error("invocation failed: {message}")]
    InvocationFailure {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A remote directory could not be reached or released.
    #[error("transport failure for {target}: {message}")]
    TransportFailure {
        target: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The request is missing required fields or carries invalid values.
    #[error("malformed request: {message}")]
    MalformedRequest { message: String },

    /// A path expression could not be applied to a value.
    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// No dispatcher accepted the request.
    #[error("internal error: no dispatcher found for {request_type} request")]
    NoDispatcher { request_type: RequestType },

    /// No handler is registered for the request type.
    #[error("unsupported operation '{request_type}'")]
    UnsupportedOperation { request_type: RequestType },

    /// A configured dispatcher token has no registered constructor.
    #[error("unknown dispatcher '{token}'")]
    UnknownDispatcher { token: String },

    /// The pipeline could not be assembled from its collaborators.
    #[error("invalid gateway configuration: {message}")]
    Configuration { message: String },

    /// A response could not be interpreted.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl GatewayError {
    /// Returns the status code used in failure envelopes.
    pub fn status(&self) -> u16 {
        match self {
            Self::AccessDenied { .. } => 403,
            Self::ResourceNotFound { .. } | Self::MemberNotFound { .. } => 404,
            Self::MalformedRequest { .. } | Self::InvalidPath { .. } => 400,
            Self::InvocationFailure { .. }
            | Self::TransportFailure { .. }
            | Self::NoDispatcher { .. }
            | Self::UnsupportedOperation { .. }
            | Self::UnknownDispatcher { .. }
            | Self::Configuration { .. }
            | Self::Internal { .. } => 500,
        }
    }

    /// Returns the stable error type name used in failure envelopes.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::AccessDenied { .. } => "AccessDenied",
            Self::ResourceNotFound { .. } => "ResourceNotFound",
            Self::MemberNotFound { .. } => "MemberNotFound",
            Self::InvocationFailure { .. } => "InvocationFailure",
            Self::TransportFailure { .. } => "TransportFailure",
            Self::MalformedRequest { .. } => "MalformedRequest",
            Self::InvalidPath { .. } => "InvalidPath",
            Self::NoDispatcher { .. } => "NoDispatcher",
            Self::UnsupportedOperation { .. } => "UnsupportedOperation",
            Self::UnknownDispatcher { .. } => "UnknownDispatcher",
            Self::Configuration { .. } => "Configuration",
            Self::Internal { .. } => "Internal",
        }
    }

    /// Returns `true` for misconfiguration errors that must not be turned
    /// into failure envelopes.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NoDispatcher { .. }
                | Self::UnsupportedOperation { .. }
                | Self::UnknownDispatcher { .. }
                | Self::Configuration { .. }
        )
    }

    /// Renders the error and its chain of sources, one cause per line.
    pub fn render_chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut cause = self.source();
        while let Some(error) = cause {
            let _ = write!(rendered, "\ncaused by: {error}");
            cause = error.source();
        }
        rendered
    }

    /// Creates an access denied error for an arbitrary subject.
    pub fn access_denied(subject: impl Into<String>) -> Self {
        Self::AccessDenied {
            subject: subject.into(),
        }
    }

    /// Creates a resource not found error.
    pub fn resource_not_found(resource: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource: resource.into(),
        }
    }

    /// Creates a member not found error.
    pub fn member_not_found(resource: impl Into<String>, member: impl Into<String>) -> Self {
        Self::MemberNotFound {
            resource: resource.into(),
            member: member.into(),
        }
    }

    /// Creates an invocation failure without an underlying cause.
    pub fn invocation(message: impl Into<String>) -> Self {
        Self::InvocationFailure {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport failure for a remote target.
    pub fn transport(
        target: impl Into<String>,
        message: impl Into<String>,
        source: Option<BoxError>,
    ) -> Self {
        Self::TransportFailure {
            target: target.into(),
            message: message.into(),
            source,
        }
    }

    /// Creates a malformed request error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a no dispatcher error.
    pub fn no_dispatcher(request_type: RequestType) -> Self {
        Self::NoDispatcher { request_type }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported_operation(request_type: RequestType) -> Self {
        Self::UnsupportedOperation { request_type }
    }

    /// Creates an unknown dispatcher error.
    pub fn unknown_dispatcher(token: impl Into<String>) -> Self {
        Self::UnknownDispatcher {
            token: token.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Converts a directory error raised while talking to a remote target.
    ///
    /// I/O failures become transport failures attributed to `target`; lookup
    /// and invocation failures keep their usual classification.
    pub fn from_remote(target: &str, error: DirectoryError) -> Self {
        match error {
            DirectoryError::Io { message, source } => Self::transport(target, message, source),
            other => Self::from(other),
        }
    }
}

impl From<DirectoryError> for GatewayError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::ResourceNotFound { resource } => Self::ResourceNotFound { resource },
            DirectoryError::MemberNotFound { resource, member } => {
                Self::MemberNotFound { resource, member }
            }
            DirectoryError::Invocation { message, source } => {
                Self::InvocationFailure { message, source }
            }
            DirectoryError::Io { message, source } => Self::TransportFailure {
                target: String::from("local directory"),
                message,
                source,
            },
        }
    }
}
