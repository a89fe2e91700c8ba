use std::sync::Arc;

use serde_json::{Map, Value};

use mgmt_types::{RequestType, ResourceName};

use crate::directory::DirectoryConnection;
use crate::errors::GatewayError;
use crate::request::ManagementRequest;
use crate::restrictor::Restrictor;

use super::{RequestHandler, deny, ensure_type_allowed};

/// Reads one attribute, several attributes, or attributes across a pattern.
///
/// Result shapes:
/// - exact name, one attribute: the attribute value;
/// - exact name, several attributes: attribute name to value;
/// - pattern: canonical resource name to a map of attribute name to value,
///   merged across every directory; the first directory to report a
///   resource wins.
#[derive(Debug)]
pub struct ReadHandler {
    restrictor: Arc<dyn Restrictor>,
}

impl ReadHandler {
    /// Creates the handler.
    pub fn new(restrictor: Arc<dyn Restrictor>) -> Self {
        Self { restrictor }
    }

    fn read_checked(
        &self,
        connection: &dyn DirectoryConnection,
        resource: &ResourceName,
        attribute: &str,
    ) -> Result<Value, GatewayError> {
        if !self
            .restrictor
            .is_attribute_read_allowed(resource, attribute)
        {
            return Err(deny(
                RequestType::Read,
                format_args!("{resource} {attribute}"),
            ));
        }
        Ok(connection.get_attribute(resource, attribute)?)
    }

    fn read_attributes(
        &self,
        connection: &dyn DirectoryConnection,
        resource: &ResourceName,
        attributes: &[String],
    ) -> Result<Value, GatewayError> {
        let mut values = Map::new();
        for attribute in attributes {
            let value = self.read_checked(connection, resource, attribute)?;
            values.insert(attribute.clone(), value);
        }
        Ok(Value::Object(values))
    }

    /// Reads `attributes` from every resource matching `pattern`, adding
    /// resources not already present in `resources`.
    ///
    /// Returns `true` when the connection held at least one matching name.
    fn collect_pattern(
        &self,
        resources: &mut Map<String, Value>,
        connection: &dyn DirectoryConnection,
        pattern: &ResourceName,
        attributes: &[String],
    ) -> Result<bool, GatewayError> {
        let mut names = connection.query_names(pattern)?;
        names.sort();

        for name in &names {
            let canonical = name.canonical();
            if resources.contains_key(&canonical) {
                continue;
            }
            let mut values = Map::new();
            for attribute in attributes {
                match self.read_checked(connection, name, attribute) {
                    Ok(value) => {
                        values.insert(attribute.clone(), value);
                    }
                    // Matched resources lacking the attribute, or deregistered
                    // since the query, drop out of the result.
                    Err(GatewayError::MemberNotFound { .. } | GatewayError::ResourceNotFound { .. }) => {}
                    Err(error) => return Err(error),
                }
            }
            if !values.is_empty() {
                resources.insert(canonical, Value::Object(values));
            }
        }
        Ok(!names.is_empty())
    }
}

impl RequestHandler for ReadHandler {
    fn request_type(&self) -> RequestType {
        RequestType::Read
    }

    fn handle(
        &self,
        request: &ManagementRequest,
        connection: &dyn DirectoryConnection,
    ) -> Result<Value, GatewayError> {
        if request.is_pattern() {
            return self.handle_all(request, &[connection]);
        }
        ensure_type_allowed(self.restrictor.as_ref(), RequestType::Read)?;
        let resource = request.require_resource()?;
        let attributes = request.attributes();

        match request.attribute() {
            Some(attribute) => self.read_checked(connection, resource, attribute),
            None => self.read_attributes(connection, resource, attributes),
        }
    }

    fn handle_all(
        &self,
        request: &ManagementRequest,
        connections: &[&dyn DirectoryConnection],
    ) -> Result<Value, GatewayError> {
        ensure_type_allowed(self.restrictor.as_ref(), RequestType::Read)?;
        let pattern = request.require_resource()?;
        let attributes = request.attributes();

        let mut resources = Map::new();
        let mut matched = false;
        for connection in connections {
            matched |= self.collect_pattern(&mut resources, *connection, pattern, attributes)?;
        }

        if !matched {
            return Err(GatewayError::resource_not_found(pattern.canonical()));
        }
        if resources.is_empty() {
            return Err(GatewayError::member_not_found(
                pattern.canonical(),
                attributes.join(","),
            ));
        }
        Ok(Value::Object(resources))
    }

    fn handles_all_targets_at_once(&self, request: &ManagementRequest) -> bool {
        request.is_pattern()
    }
}
