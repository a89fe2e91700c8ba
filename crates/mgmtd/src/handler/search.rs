use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use mgmt_types::RequestType;

use crate::directory::DirectoryConnection;
use crate::errors::GatewayError;
use crate::request::ManagementRequest;
use crate::restrictor::Restrictor;

use super::{RequestHandler, ensure_type_allowed};

/// Returns the sorted, de-duplicated canonical names matching a pattern.
#[derive(Debug)]
pub struct SearchHandler {
    restrictor: Arc<dyn Restrictor>,
}

impl SearchHandler {
    /// Creates the handler.
    pub fn new(restrictor: Arc<dyn Restrictor>) -> Self {
        Self { restrictor }
    }
}

impl RequestHandler for SearchHandler {
    fn request_type(&self) -> RequestType {
        RequestType::Search
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
        ensure_type_allowed(self.restrictor.as_ref(), RequestType::Search)?;
        let pattern = request.require_resource()?;

        let mut names = BTreeSet::new();
        for connection in connections {
            names.extend(
                connection
                    .query_names(pattern)?
                    .iter()
                    .map(|name| name.canonical()),
            );
        }
        Ok(Value::Array(names.into_iter().map(Value::String).collect()))
    }

    fn handles_all_targets_at_once(&self, _request: &ManagementRequest) -> bool {
        true
    }
}
