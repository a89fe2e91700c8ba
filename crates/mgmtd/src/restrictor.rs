//! Access restriction policy.
//!
//! Every handler consults a [`Restrictor`] before touching the directory. The
//! two built-in policies cover the configuration surface; embedding
//! applications supply their own implementations for finer-grained policies.

use std::fmt;
use std::sync::Arc;

use mgmt_config::RestrictorKind;
use mgmt_types::{RequestType, ResourceName};

/// Policy deciding which requests may proceed.
pub trait Restrictor: Send + Sync {
    /// Returns `true` when requests of `request_type` are permitted at all.
    fn is_type_allowed(&self, request_type: RequestType) -> bool;

    /// Returns `true` when `attribute` of `resource` may be read.
    fn is_attribute_read_allowed(&self, resource: &ResourceName, attribute: &str) -> bool;

    /// Returns `true` when `attribute` of `resource` may be written.
    fn is_attribute_write_allowed(&self, resource: &ResourceName, attribute: &str) -> bool;

    /// Returns `true` when `operation` of `resource` may be invoked.
    fn is_operation_allowed(&self, resource: &ResourceName, operation: &str) -> bool;

    /// Returns `true` when a client identified by host name or address may
    /// use the gateway.
    fn is_remote_access_allowed(&self, host: &str, address: &str) -> bool;
}

/// Restrictor permitting every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllRestrictor;

impl Restrictor for AllowAllRestrictor {
    fn is_type_allowed(&self, _request_type: RequestType) -> bool {
        true
    }

    fn is_attribute_read_allowed(&self, _resource: &ResourceName, _attribute: &str) -> bool {
        true
    }

    fn is_attribute_write_allowed(&self, _resource: &ResourceName, _attribute: &str) -> bool {
        true
    }

    fn is_operation_allowed(&self, _resource: &ResourceName, _operation: &str) -> bool {
        true
    }

    fn is_remote_access_allowed(&self, _host: &str, _address: &str) -> bool {
        true
    }
}

/// Restrictor refusing every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAllRestrictor;

impl Restrictor for DenyAllRestrictor {
    fn is_type_allowed(&self, _request_type: RequestType) -> bool {
        false
    }

    fn is_attribute_read_allowed(&self, _resource: &ResourceName, _attribute: &str) -> bool {
        false
    }

    fn is_attribute_write_allowed(&self, _resource: &ResourceName, _attribute: &str) -> bool {
        false
    }

    fn is_operation_allowed(&self, _resource: &ResourceName, _operation: &str) -> bool {
        false
    }

    fn is_remote_access_allowed(&self, _host: &str, _address: &str) -> bool {
        false
    }
}

/// Builds the restrictor selected in configuration.
pub fn restrictor_for(kind: RestrictorKind) -> Arc<dyn Restrictor> {
    match kind {
        RestrictorKind::AllowAll => Arc::new(AllowAllRestrictor),
        RestrictorKind::DenyAll => Arc::new(DenyAllRestrictor),
    }
}

impl fmt::Debug for dyn Restrictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Restrictor")
    }
}
