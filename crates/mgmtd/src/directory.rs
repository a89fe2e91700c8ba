//! Collaborator seams for the managed-resource directory.
//!
//! The gateway never owns managed resources. It reaches them through a
//! [`DirectoryConnection`], either in-process or through a [`Connector`] that
//! opens a [`RemoteConnection`] to a remote agent for the duration of a single
//! request.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use mgmt_types::ResourceName;

use crate::errors::BoxError;

/// Failures reported by a directory implementation.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No resource is registered under the name.
    #[error("resource not found: {resource}")]
    ResourceNotFound { resource: String },
    /// The resource has no such attribute or operation.
    #[error("'{member}' not found on resource {resource}")]
    MemberNotFound { resource: String, member: String },
    /// The resource raised an error while serving the call.
    #[error("{message}")]
    Invocation {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    /// The connection to the directory failed.
    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl DirectoryError {
    /// Creates a resource-not-found error for `resource`.
    pub fn resource_not_found(resource: &ResourceName) -> Self {
        Self::ResourceNotFound {
            resource: resource.canonical(),
        }
    }

    /// Creates a member-not-found error for `member` on `resource`.
    pub fn member_not_found(resource: &ResourceName, member: impl Into<String>) -> Self {
        Self::MemberNotFound {
            resource: resource.canonical(),
            member: member.into(),
        }
    }

    /// Creates an invocation error with an optional cause.
    pub fn invocation(message: impl Into<String>, source: Option<BoxError>) -> Self {
        Self::Invocation {
            message: message.into(),
            source,
        }
    }

    /// Creates a connection error with an optional cause.
    pub fn io(message: impl Into<String>, source: Option<BoxError>) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }
}

/// Metadata describing one attribute of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeInfo {
    /// Declared value type.
    #[serde(rename = "type")]
    pub value_type: String,
    /// Human-readable description.
    #[serde(rename = "desc")]
    pub description: String,
    /// Whether the attribute accepts writes.
    #[serde(rename = "rw")]
    pub writable: bool,
}

/// Metadata describing one operation parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterInfo {
    /// Parameter name.
    pub name: String,
    /// Declared parameter type.
    #[serde(rename = "type")]
    pub value_type: String,
}

/// Metadata describing one operation of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationInfo {
    /// Declared parameters in invocation order.
    pub args: Vec<ParameterInfo>,
    /// Declared return type.
    #[serde(rename = "ret")]
    pub return_type: String,
    /// Human-readable description.
    #[serde(rename = "desc")]
    pub description: String,
}

/// Metadata describing a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceInfo {
    /// Human-readable description.
    #[serde(rename = "desc")]
    pub description: String,
    /// Attributes keyed by name.
    #[serde(rename = "attr", skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeInfo>,
    /// Operations keyed by name.
    #[serde(rename = "op", skip_serializing_if = "BTreeMap::is_empty")]
    pub operations: BTreeMap<String, OperationInfo>,
}

/// A live connection to a directory of managed resources.
pub trait DirectoryConnection: Send + Sync {
    /// Reads an attribute value.
    fn get_attribute(&self, resource: &ResourceName, attribute: &str)
    -> Result<Value, DirectoryError>;

    /// Replaces an attribute value and returns the value it held before.
    fn set_attribute(
        &self,
        resource: &ResourceName,
        attribute: &str,
        value: Value,
    ) -> Result<Value, DirectoryError>;

    /// Invokes an operation with positional arguments.
    fn invoke(
        &self,
        resource: &ResourceName,
        operation: &str,
        arguments: &[Value],
    ) -> Result<Value, DirectoryError>;

    /// Returns every registered resource name matching `pattern`.
    ///
    /// An exact name yields itself when registered and nothing otherwise.
    fn query_names(&self, pattern: &ResourceName) -> Result<Vec<ResourceName>, DirectoryError>;

    /// Describes a registered resource.
    fn describe(&self, resource: &ResourceName) -> Result<ResourceInfo, DirectoryError>;
}

/// Directory holding no resources.
///
/// Stands in when a dispatcher has no directories, so handlers that never
/// touch the directory still run their checks.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct EmptyDirectory;

impl DirectoryConnection for EmptyDirectory {
    fn get_attribute(
        &self,
        resource: &ResourceName,
        _attribute: &str,
    ) -> Result<Value, DirectoryError> {
        Err(DirectoryError::resource_not_found(resource))
    }

    fn set_attribute(
        &self,
        resource: &ResourceName,
        _attribute: &str,
        _value: Value,
    ) -> Result<Value, DirectoryError> {
        Err(DirectoryError::resource_not_found(resource))
    }

    fn invoke(
        &self,
        resource: &ResourceName,
        _operation: &str,
        _arguments: &[Value],
    ) -> Result<Value, DirectoryError> {
        Err(DirectoryError::resource_not_found(resource))
    }

    fn query_names(&self, _pattern: &ResourceName) -> Result<Vec<ResourceName>, DirectoryError> {
        Ok(Vec::new())
    }

    fn describe(&self, resource: &ResourceName) -> Result<ResourceInfo, DirectoryError> {
        Err(DirectoryError::resource_not_found(resource))
    }
}

/// A directory connection opened for a single remote request.
pub trait RemoteConnection: DirectoryConnection {
    /// Releases the connection.
    fn close(&mut self) -> Result<(), DirectoryError>;
}

/// Opens connections to remote directories.
pub trait Connector: Send + Sync {
    /// Connects to `url` using the prepared connection environment.
    fn connect(
        &self,
        url: &str,
        environment: &BTreeMap<String, Value>,
    ) -> Result<Box<dyn RemoteConnection>, DirectoryError>;
}

/// Owns a remote connection and closes it on every exit path.
///
/// [`ConnectionGuard::release`] closes the connection and reports close
/// failures. When the guard is dropped without an explicit release, for
/// example because the handler failed, the connection is still closed and a
/// close failure is logged instead of masking the handler error.
pub struct ConnectionGuard {
    connection: Option<Box<dyn RemoteConnection>>,
    url: String,
}

impl ConnectionGuard {
    /// Takes ownership of an open connection to `url`.
    pub fn new(connection: Box<dyn RemoteConnection>, url: impl Into<String>) -> Self {
        Self {
            connection: Some(connection),
            url: url.into(),
        }
    }

    /// Returns the guarded connection, if it has not been released.
    pub fn connection(&self) -> Option<&dyn DirectoryConnection> {
        self.connection
            .as_deref()
            .map(|connection| connection as &dyn DirectoryConnection)
    }

    /// Closes the connection and reports any failure.
    pub fn release(mut self) -> Result<(), DirectoryError> {
        match self.connection.take() {
            Some(mut connection) => connection.close(),
            None => Ok(()),
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take()
            && let Err(error) = connection.close()
        {
            warn!(
                target: crate::dispatch::DISPATCH_TARGET,
                url = %self.url,
                %error,
                "failed to close remote connection"
            );
        }
    }
}

impl fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("url", &self.url)
            .field("open", &self.connection.is_some())
            .finish()
    }
}
