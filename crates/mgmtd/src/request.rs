//! Validated management requests.
//!
//! A [`ManagementRequest`] is immutable once built. Requests arrive either as
//! [`WireRequest`] values decoded from a JSON body or through the typed
//! constructors used by embedding code and tests. Both paths are checked by
//! [`ManagementRequest::validate`] before any dispatcher sees the request.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use url::Url;

use mgmt_types::{AttributeSelector, RequestType, ResourceName, WireRequest, WireTarget};

use crate::errors::GatewayError;

/// Option key carrying the remote user before credential translation.
pub const USER_OPTION: &str = "user";
/// Option key carrying the remote password before credential translation.
pub const PASSWORD_OPTION: &str = "password";

/// Remote directory descriptor attached to proxied requests.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteTarget {
    url: String,
    options: BTreeMap<String, Value>,
}

impl RemoteTarget {
    /// Creates a target without connection options.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            options: BTreeMap::new(),
        }
    }

    /// Adds user and password options.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.options
            .insert(USER_OPTION.to_owned(), Value::String(user.into()));
        self.options
            .insert(PASSWORD_OPTION.to_owned(), Value::String(password.into()));
        self
    }

    /// Adds a connection option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Returns the remote service address.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the raw connection options, credentials included.
    pub fn options(&self) -> &BTreeMap<String, Value> {
        &self.options
    }

    fn from_wire(target: WireTarget) -> Result<Self, GatewayError> {
        let WireTarget {
            url,
            user,
            password,
            mut options,
        } = target;
        if let Some(user) = user {
            options.insert(USER_OPTION.to_owned(), Value::String(user));
        }
        if let Some(password) = password {
            options.insert(PASSWORD_OPTION.to_owned(), Value::String(password));
        }
        let target = Self { url, options };
        target.validate()?;
        Ok(target)
    }

    fn validate(&self) -> Result<(), GatewayError> {
        if self.url.trim().is_empty() {
            return Err(GatewayError::malformed("target url must not be empty"));
        }
        Url::parse(&self.url).map_err(|error| {
            GatewayError::malformed(format!("invalid target url '{}': {error}", self.url))
        })?;
        Ok(())
    }
}

/// An immutable, validated management request.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagementRequest {
    request_type: RequestType,
    resource: Option<ResourceName>,
    attributes: Vec<String>,
    operation: Option<String>,
    path: Option<String>,
    arguments: Vec<Value>,
    target: Option<RemoteTarget>,
}

impl ManagementRequest {
    fn bare(request_type: RequestType) -> Self {
        Self {
            request_type,
            resource: None,
            attributes: Vec::new(),
            operation: None,
            path: None,
            arguments: Vec::new(),
            target: None,
        }
    }

    /// Reads one attribute.
    pub fn read(resource: ResourceName, attribute: impl Into<String>) -> Self {
        Self {
            resource: Some(resource),
            attributes: vec![attribute.into()],
            ..Self::bare(RequestType::Read)
        }
    }

    /// Reads several attributes in one request.
    pub fn read_many<I, S>(resource: ResourceName, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resource: Some(resource),
            attributes: attributes.into_iter().map(Into::into).collect(),
            ..Self::bare(RequestType::Read)
        }
    }

    /// Writes a new attribute value.
    pub fn write(resource: ResourceName, attribute: impl Into<String>, value: Value) -> Self {
        Self {
            resource: Some(resource),
            attributes: vec![attribute.into()],
            arguments: vec![value],
            ..Self::bare(RequestType::Write)
        }
    }

    /// Invokes an operation with positional arguments.
    pub fn exec(resource: ResourceName, operation: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            resource: Some(resource),
            operation: Some(operation.into()),
            arguments,
            ..Self::bare(RequestType::Exec)
        }
    }

    /// Lists every resource and its metadata.
    pub fn list() -> Self {
        Self::bare(RequestType::List)
    }

    /// Requests the gateway version.
    pub fn version() -> Self {
        Self::bare(RequestType::Version)
    }

    /// Searches for resource names matching a pattern.
    pub fn search(pattern: ResourceName) -> Self {
        Self {
            resource: Some(pattern),
            ..Self::bare(RequestType::Search)
        }
    }

    /// Attaches a path expression.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Restricts a listing to resources matching `pattern`.
    #[must_use]
    pub fn with_resource(mut self, pattern: ResourceName) -> Self {
        self.resource = Some(pattern);
        self
    }

    /// Routes the request to a remote directory.
    #[must_use]
    pub fn with_target(mut self, target: RemoteTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Builds a validated request from its wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MalformedRequest`] when the resource name does
    /// not parse or a field required by the request type is missing.
    pub fn from_wire(wire: WireRequest) -> Result<Self, GatewayError> {
        let WireRequest {
            request_type,
            resource,
            attribute,
            operation,
            path,
            arguments,
            target,
        } = wire;

        let resource = resource
            .map(|text| {
                ResourceName::parse(&text).map_err(|error| GatewayError::malformed(error.to_string()))
            })
            .transpose()?;
        let target = target.map(RemoteTarget::from_wire).transpose()?;

        let request = Self {
            request_type,
            resource,
            attributes: attribute
                .as_ref()
                .map(AttributeSelector::names)
                .unwrap_or_default(),
            operation,
            path: path.filter(|path| !path.is_empty()),
            arguments,
            target,
        };
        request.validate()?;
        Ok(request)
    }

    /// Builds a validated request from an arbitrary JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MalformedRequest`] when the value does not
    /// decode as a request or fails validation.
    pub fn from_value(value: Value) -> Result<Self, GatewayError> {
        let wire: WireRequest = serde_json::from_value(value)
            .map_err(|error| GatewayError::malformed(error.to_string()))?;
        Self::from_wire(wire)
    }

    /// Checks the per-type field requirements.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MalformedRequest`] describing the first
    /// missing or inconsistent field.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.request_type.requires_member() && self.resource.is_none() {
            return Err(self.missing("resource"));
        }
        match self.request_type {
            RequestType::Read => {
                if self.attributes.is_empty() {
                    return Err(self.missing("attribute"));
                }
            }
            RequestType::Write => {
                if self.attributes.len() != 1 {
                    return Err(GatewayError::malformed(
                        "write requests take exactly one attribute",
                    ));
                }
                if self.arguments.len() != 1 {
                    return Err(GatewayError::malformed(
                        "write requests take exactly one value",
                    ));
                }
                if self.is_pattern() {
                    return Err(GatewayError::malformed(
                        "write requests need an exact resource name",
                    ));
                }
            }
            RequestType::Exec => {
                if self.operation.as_deref().is_none_or(str::is_empty) {
                    return Err(self.missing("operation"));
                }
                if self.is_pattern() {
                    return Err(GatewayError::malformed(
                        "exec requests need an exact resource name",
                    ));
                }
            }
            RequestType::Search => {
                if self.resource.is_none() {
                    return Err(self.missing("resource pattern"));
                }
            }
            RequestType::List | RequestType::Version => {}
        }
        if self.attributes.iter().any(String::is_empty) {
            return Err(GatewayError::malformed("attribute names must not be empty"));
        }
        if let Some(target) = &self.target {
            target.validate()?;
        }
        Ok(())
    }

    fn missing(&self, field: &str) -> GatewayError {
        GatewayError::malformed(format!("{} request needs a {field}", self.request_type))
    }

    /// Returns the operation kind.
    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    /// Returns the resource name or pattern.
    pub fn resource(&self) -> Option<&ResourceName> {
        self.resource.as_ref()
    }

    /// Returns the resource name, failing when it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MalformedRequest`] when no resource was given.
    pub fn require_resource(&self) -> Result<&ResourceName, GatewayError> {
        self.resource.as_ref().ok_or_else(|| self.missing("resource"))
    }

    /// Returns the requested attribute names in request order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Returns the attribute when exactly one was requested.
    pub fn attribute(&self) -> Option<&str> {
        match self.attributes.as_slice() {
            [single] => Some(single.as_str()),
            _ => None,
        }
    }

    /// Returns `true` when more than one attribute was requested.
    pub fn is_multi_attribute(&self) -> bool {
        self.attributes.len() > 1
    }

    /// Returns `true` when the resource is a wildcard pattern.
    pub fn is_pattern(&self) -> bool {
        self.resource.as_ref().is_some_and(ResourceName::is_pattern)
    }

    /// Returns the operation name for exec requests.
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// Returns the attribute or operation the request addresses.
    pub fn member(&self) -> Option<&str> {
        match self.request_type {
            RequestType::Exec => self.operation(),
            _ => self.attribute(),
        }
    }

    /// Returns the path expression.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns the positional arguments.
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Returns the value carried by a write request.
    pub fn write_value(&self) -> Option<&Value> {
        match self.request_type {
            RequestType::Write => self.arguments.first(),
            _ => None,
        }
    }

    /// Returns the remote target.
    pub fn target(&self) -> Option<&RemoteTarget> {
        self.target.as_ref()
    }

    /// Returns the remote target's address, if any.
    pub fn target_url(&self) -> Option<&str> {
        self.target.as_ref().map(RemoteTarget::url)
    }
}

impl fmt::Display for ManagementRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.request_type)?;
        if let Some(resource) = &self.resource {
            write!(f, " {resource}")?;
        }
        match self.request_type {
            RequestType::Exec => {
                if let Some(operation) = &self.operation {
                    write!(f, " {operation}")?;
                }
            }
            _ if !self.attributes.is_empty() => write!(f, " {}", self.attributes.join(","))?,
            _ => {}
        }
        if let Some(path) = &self.path {
            write!(f, " path={path}")?;
        }
        if let Some(target) = &self.target {
            write!(f, " target={}", target.url)?;
        }
        Ok(())
    }
}
