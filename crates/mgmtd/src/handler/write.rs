use std::sync::Arc;

use serde_json::Value;

use mgmt_types::RequestType;

use crate::converter::replace_at_path;
use crate::directory::DirectoryConnection;
use crate::errors::GatewayError;
use crate::request::ManagementRequest;
use crate::restrictor::Restrictor;

use super::{RequestHandler, deny, ensure_type_allowed};

/// Writes an attribute and returns the value it replaced.
///
/// With a path, only the inner value selected by the path is replaced and the
/// previous inner value is returned.
#[derive(Debug)]
pub struct WriteHandler {
    restrictor: Arc<dyn Restrictor>,
}

impl WriteHandler {
    /// Creates the handler.
    pub fn new(restrictor: Arc<dyn Restrictor>) -> Self {
        Self { restrictor }
    }
}

impl RequestHandler for WriteHandler {
    fn request_type(&self) -> RequestType {
        RequestType::Write
    }

    fn handle(
        &self,
        request: &ManagementRequest,
        connection: &dyn DirectoryConnection,
    ) -> Result<Value, GatewayError> {
        ensure_type_allowed(self.restrictor.as_ref(), RequestType::Write)?;
        let resource = request.require_resource()?;
        let attribute = request
            .attribute()
            .ok_or_else(|| GatewayError::malformed("write request needs one attribute"))?;
        let value = request
            .write_value()
            .cloned()
            .ok_or_else(|| GatewayError::malformed("write request needs a value"))?;

        if !self
            .restrictor
            .is_attribute_write_allowed(resource, attribute)
        {
            return Err(deny(RequestType::Write, format_args!("{resource} {attribute}")));
        }

        match request.path() {
            Some(path) => {
                let mut current = connection.get_attribute(resource, attribute)?;
                let previous = replace_at_path(&mut current, path, value)?;
                connection.set_attribute(resource, attribute, current)?;
                Ok(previous)
            }
            None => Ok(connection.set_attribute(resource, attribute, value)?),
        }
    }

    fn uses_path_on_return_value(&self) -> bool {
        false
    }
}
