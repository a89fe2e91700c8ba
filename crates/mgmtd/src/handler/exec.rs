use std::sync::Arc;

use serde_json::Value;

use mgmt_types::RequestType;

use crate::converter::extract_path;
use crate::directory::DirectoryConnection;
use crate::errors::GatewayError;
use crate::request::ManagementRequest;
use crate::restrictor::Restrictor;

use super::{RequestHandler, deny, ensure_type_allowed};

/// Invokes an operation and returns its result.
#[derive(Debug)]
pub struct ExecHandler {
    restrictor: Arc<dyn Restrictor>,
}

impl ExecHandler {
    /// Creates the handler.
    pub fn new(restrictor: Arc<dyn Restrictor>) -> Self {
        Self { restrictor }
    }
}

impl RequestHandler for ExecHandler {
    fn request_type(&self) -> RequestType {
        RequestType::Exec
    }

    fn handle(
        &self,
        request: &ManagementRequest,
        connection: &dyn DirectoryConnection,
    ) -> Result<Value, GatewayError> {
        ensure_type_allowed(self.restrictor.as_ref(), RequestType::Exec)?;
        let resource = request.require_resource()?;
        let operation = request
            .operation()
            .ok_or_else(|| GatewayError::malformed("exec request needs an operation"))?;

        if !self.restrictor.is_operation_allowed(resource, operation) {
            return Err(deny(RequestType::Exec, format_args!("{resource} {operation}")));
        }

        let result = connection.invoke(resource, operation, request.arguments())?;
        match request.path() {
            Some(path) => extract_path(result, path),
            None => Ok(result),
        }
    }

    fn uses_path_on_return_value(&self) -> bool {
        false
    }
}
