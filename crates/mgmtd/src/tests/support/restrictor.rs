use std::collections::BTreeSet;

use mgmt_types::{RequestType, ResourceName};

use crate::restrictor::Restrictor;

/// Restrictor refusing a fixed set of members and request types.
#[derive(Debug, Default, Clone)]
pub struct SelectiveRestrictor {
    denied_members: BTreeSet<String>,
    denied_types: BTreeSet<RequestType>,
}

impl SelectiveRestrictor {
    /// Refuses reads, writes and invocations of `member` on any resource.
    pub fn denying_member(member: &str) -> Self {
        Self::default().and_member(member)
    }

    /// Refuses every request of `request_type`.
    pub fn denying_type(request_type: RequestType) -> Self {
        let mut restrictor = Self::default();
        restrictor.denied_types.insert(request_type);
        restrictor
    }

    pub fn and_member(mut self, member: &str) -> Self {
        self.denied_members.insert(member.to_owned());
        self
    }

    fn member_allowed(&self, member: &str) -> bool {
        !self.denied_members.contains(member)
    }
}

impl Restrictor for SelectiveRestrictor {
    fn is_type_allowed(&self, request_type: RequestType) -> bool {
        !self.denied_types.contains(&request_type)
    }

    fn is_attribute_read_allowed(&self, _resource: &ResourceName, attribute: &str) -> bool {
        self.member_allowed(attribute)
    }

    fn is_attribute_write_allowed(&self, _resource: &ResourceName, attribute: &str) -> bool {
        self.member_allowed(attribute)
    }

    fn is_operation_allowed(&self, _resource: &ResourceName, operation: &str) -> bool {
        self.member_allowed(operation)
    }

    fn is_remote_access_allowed(&self, _host: &str, _address: &str) -> bool {
        true
    }
}
