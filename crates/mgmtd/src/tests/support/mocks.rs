//! `mockall` doubles for the gateway seams.

use std::collections::BTreeMap;

use mockall::mock;
use serde_json::Value;

use mgmt_types::{RequestType, ResourceName};

use crate::directory::{
    Connector, DirectoryConnection, DirectoryError, RemoteConnection, ResourceInfo,
};
use crate::restrictor::Restrictor;

mock! {
    pub Directory {}
    impl DirectoryConnection for Directory {
        fn get_attribute(
            &self,
            resource: &ResourceName,
            attribute: &str,
        ) -> Result<Value, DirectoryError>;
        fn set_attribute(
            &self,
            resource: &ResourceName,
            attribute: &str,
            value: Value,
        ) -> Result<Value, DirectoryError>;
        fn invoke(
            &self,
            resource: &ResourceName,
            operation: &str,
            arguments: &[Value],
        ) -> Result<Value, DirectoryError>;
        fn query_names(&self, pattern: &ResourceName) -> Result<Vec<ResourceName>, DirectoryError>;
        fn describe(&self, resource: &ResourceName) -> Result<ResourceInfo, DirectoryError>;
    }
}

mock! {
    pub RemoteConnector {}
    impl Connector for RemoteConnector {
        fn connect(
            &self,
            url: &str,
            environment: &BTreeMap<String, Value>,
        ) -> Result<Box<dyn RemoteConnection>, DirectoryError>;
    }
}

mock! {
    pub Policy {}
    impl Restrictor for Policy {
        fn is_type_allowed(&self, request_type: RequestType) -> bool;
        fn is_attribute_read_allowed(&self, resource: &ResourceName, attribute: &str) -> bool;
        fn is_attribute_write_allowed(&self, resource: &ResourceName, attribute: &str) -> bool;
        fn is_operation_allowed(&self, resource: &ResourceName, operation: &str) -> bool;
        fn is_remote_access_allowed(&self, host: &str, address: &str) -> bool;
    }
}
