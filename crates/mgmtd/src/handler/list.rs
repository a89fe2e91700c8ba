use std::sync::Arc;

use serde_json::{Map, Value};

use mgmt_types::{RequestType, ResourceName};

use crate::directory::DirectoryConnection;
use crate::errors::GatewayError;
use crate::request::ManagementRequest;
use crate::restrictor::Restrictor;

use super::{RequestHandler, ensure_type_allowed};

/// Pattern matching every resource.
const EVERYTHING: &str = "*:*";

/// Lists resource metadata as `domain -> properties -> description`.
///
/// Results from every connection are merged; the first connection to report
/// a resource wins.
#[derive(Debug)]
pub struct ListHandler {
    restrictor: Arc<dyn Restrictor>,
}

impl ListHandler {
    /// Creates the handler.
    pub fn new(restrictor: Arc<dyn Restrictor>) -> Self {
        Self { restrictor }
    }

    fn collect_into(
        tree: &mut Map<String, Value>,
        connection: &dyn DirectoryConnection,
        pattern: &ResourceName,
    ) -> Result<(), GatewayError> {
        for name in connection.query_names(pattern)? {
            let info = match connection.describe(&name) {
                Ok(info) => info,
                Err(error) => match GatewayError::from(error) {
                    GatewayError::ResourceNotFound { .. } => continue,
                    other => return Err(other),
                },
            };
            let domain = tree
                .entry(name.domain().to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(resources) = domain {
                let info = serde_json::to_value(info)
                    .map_err(|error| GatewayError::internal(error.to_string()))?;
                resources.entry(name.canonical_properties()).or_insert(info);
            }
        }
        Ok(())
    }
}

impl RequestHandler for ListHandler {
    fn request_type(&self) -> RequestType {
        RequestType::List
    }

    fn handle(
        &self,
        request: &ManagementRequest,
        connection: &dyn DirectoryConnection,
    ) -> Result<Value, GatewayError> {
        self.handle_all(request, &[connection])
    }

    fn handle_all(
        &self,
        request: &ManagementRequest,
        connections: &[&dyn DirectoryConnection],
    ) -> Result<Value, GatewayError> {
        ensure_type_allowed(self.restrictor.as_ref(), RequestType::List)?;
        let pattern = match request.resource() {
            Some(pattern) => pattern.clone(),
            None => ResourceName::parse(EVERYTHING)
                .map_err(|error| GatewayError::internal(error.to_string()))?,
        };

        let mut tree = Map::new();
        for connection in connections {
            Self::collect_into(&mut tree, *connection, &pattern)?;
        }
        Ok(Value::Object(tree))
    }

    fn handles_all_targets_at_once(&self, _request: &ManagementRequest) -> bool {
        true
    }
}
