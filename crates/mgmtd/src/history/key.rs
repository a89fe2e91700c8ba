use std::fmt;

use mgmt_types::{RequestType, ResourceName};

use crate::request::ManagementRequest;

/// Whether a history key tracks an attribute or an operation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Attribute values observed by reads and writes.
    Attribute,
    /// Operation results.
    Operation,
}

/// Identity of a tracked value.
///
/// Keys whose resource is a pattern are configuration entries only: they
/// never hold values themselves but provide the capacity for exact keys they
/// cover.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    kind: MemberKind,
    resource: ResourceName,
    member: String,
    path: Option<String>,
    target: Option<String>,
}

impl HistoryKey {
    /// Key for an attribute, optionally narrowed by path and remote target.
    pub fn attribute(
        resource: ResourceName,
        attribute: impl Into<String>,
        path: Option<String>,
        target: Option<String>,
    ) -> Self {
        Self {
            kind: MemberKind::Attribute,
            resource,
            member: attribute.into(),
            path,
            target,
        }
    }

    /// Key for an operation result on an optional remote target.
    pub fn operation(
        resource: ResourceName,
        operation: impl Into<String>,
        target: Option<String>,
    ) -> Self {
        Self {
            kind: MemberKind::Operation,
            resource,
            member: operation.into(),
            path: None,
            target,
        }
    }

    /// Derives the exact key for a single-valued request.
    ///
    /// Returns `None` for listings, version and search requests, and for
    /// reads that select several attributes or use a pattern; those are
    /// tracked per attribute by the store.
    pub fn for_request(request: &ManagementRequest) -> Option<Self> {
        let resource = request.resource()?.clone();
        let target = request.target_url().map(str::to_owned);
        let path = request.path().map(str::to_owned);
        match request.request_type() {
            RequestType::Read | RequestType::Write => {
                let attribute = request.attribute()?;
                Some(Self::attribute(resource, attribute, path, target))
            }
            RequestType::Exec => {
                let operation = request.operation()?;
                Some(Self::operation(resource, operation, target))
            }
            RequestType::List | RequestType::Version | RequestType::Search => None,
        }
    }

    /// Returns the tracked member kind.
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Returns the resource name or pattern.
    pub fn resource(&self) -> &ResourceName {
        &self.resource
    }

    /// Returns the attribute or operation name.
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Returns `true` for configuration-only pattern keys.
    pub fn is_pattern(&self) -> bool {
        self.resource.is_pattern()
    }

    /// Returns `true` when this pattern key covers the exact key `other`.
    pub fn matches(&self, other: &Self) -> bool {
        self.is_pattern()
            && !other.is_pattern()
            && self.kind == other.kind
            && self.member == other.member
            && self.path == other.path
            && self.target == other.target
            && self.resource.matches(&other.resource)
    }
}

impl fmt::Display for HistoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            MemberKind::Attribute => "attribute",
            MemberKind::Operation => "operation",
        };
        write!(f, "{kind} {} {}", self.resource, self.member)?;
        if let Some(path) = &self.path {
            write!(f, " path={path}")?;
        }
        if let Some(target) = &self.target {
            write!(f, " target={target}")?;
        }
        Ok(())
    }
}
