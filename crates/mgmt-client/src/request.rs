use serde_json::Value;

use mgmt_types::{AttributeSelector, RequestType, ResourceName, WireRequest, WireTarget};

/// A request built on the client side.
///
/// Wraps the [`WireRequest`] sent to the gateway so requests are only built
/// through shape-correct constructors.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRequest {
    wire: WireRequest,
}

impl ClientRequest {
    fn with_resource(request_type: RequestType, resource: &ResourceName) -> Self {
        let mut wire = WireRequest::new(request_type);
        wire.resource = Some(resource.canonical());
        Self { wire }
    }

    /// Reads one attribute.
    #[must_use]
    pub fn read(resource: &ResourceName, attribute: impl Into<String>) -> Self {
        let mut request = Self::with_resource(RequestType::Read, resource);
        request.wire.attribute = Some(AttributeSelector::Single(attribute.into()));
        request
    }

    /// Reads several attributes of one resource, or of every resource a
    /// pattern matches.
    #[must_use]
    pub fn read_many<I, S>(resource: &ResourceName, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut request = Self::with_resource(RequestType::Read, resource);
        request.wire.attribute = Some(AttributeSelector::Multiple(
            attributes.into_iter().map(Into::into).collect(),
        ));
        request
    }

    /// Writes an attribute.
    #[must_use]
    pub fn write(resource: &ResourceName, attribute: impl Into<String>, value: Value) -> Self {
        let mut request = Self::with_resource(RequestType::Write, resource);
        request.wire.attribute = Some(AttributeSelector::Single(attribute.into()));
        request.wire.arguments = vec![value];
        request
    }

    /// Invokes an operation.
    #[must_use]
    pub fn exec(resource: &ResourceName, operation: impl Into<String>, arguments: Vec<Value>) -> Self {
        let mut request = Self::with_resource(RequestType::Exec, resource);
        request.wire.operation = Some(operation.into());
        request.wire.arguments = arguments;
        request
    }

    /// Searches for resource names matching a pattern.
    #[must_use]
    pub fn search(pattern: &ResourceName) -> Self {
        Self::with_resource(RequestType::Search, pattern)
    }

    /// Lists resource metadata.
    #[must_use]
    pub fn list() -> Self {
        Self {
            wire: WireRequest::new(RequestType::List),
        }
    }

    /// Asks for the gateway version.
    #[must_use]
    pub fn version() -> Self {
        Self {
            wire: WireRequest::new(RequestType::Version),
        }
    }

    /// Narrows the result to an inner element.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.wire.path = Some(path.into());
        self
    }

    /// Proxies the request to a remote directory.
    #[must_use]
    pub fn with_target(mut self, url: impl Into<String>) -> Self {
        self.wire.target = Some(WireTarget {
            url: url.into(),
            user: None,
            password: None,
            options: Default::default(),
        });
        self
    }

    /// Attaches credentials to the remote target. Has no effect without one.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        if let Some(target) = self.wire.target.as_mut() {
            target.user = Some(user.into());
            target.password = Some(password.into());
        }
        self
    }

    /// Returns the request type.
    #[must_use]
    pub fn request_type(&self) -> RequestType {
        self.wire.request_type
    }

    /// Returns the wire form of the request.
    #[must_use]
    pub fn as_wire(&self) -> &WireRequest {
        &self.wire
    }

    /// Consumes the request, returning its wire form.
    #[must_use]
    pub fn into_wire(self) -> WireRequest {
        self.wire
    }
}
