use std::sync::Arc;

use serde_json::{Value, json};

use mgmt_types::RequestType;

use crate::directory::DirectoryConnection;
use crate::errors::GatewayError;
use crate::request::ManagementRequest;
use crate::restrictor::Restrictor;

use super::{RequestHandler, ensure_type_allowed};

/// Version of the request/response protocol spoken by the gateway.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Reports the gateway and protocol versions.
#[derive(Debug)]
pub struct VersionHandler {
    restrictor: Arc<dyn Restrictor>,
}

impl VersionHandler {
    /// Creates the handler.
    pub fn new(restrictor: Arc<dyn Restrictor>) -> Self {
        Self { restrictor }
    }
}

impl RequestHandler for VersionHandler {
    fn request_type(&self) -> RequestType {
        RequestType::Version
    }

    fn handle(
        &self,
        _request: &ManagementRequest,
        _connection: &dyn DirectoryConnection,
    ) -> Result<Value, GatewayError> {
        ensure_type_allowed(self.restrictor.as_ref(), RequestType::Version)?;
        Ok(json!({
            "agent": env!("CARGO_PKG_VERSION"),
            "protocol": PROTOCOL_VERSION,
        }))
    }
}
