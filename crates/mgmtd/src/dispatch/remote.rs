use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::converter::ValueConverter;
use crate::directory::{ConnectionGuard, Connector};
use crate::errors::GatewayError;
use crate::handler::HandlerRegistry;
use crate::request::{ManagementRequest, PASSWORD_OPTION, USER_OPTION};
use crate::restrictor::Restrictor;

use super::{DISPATCH_TARGET, DispatchOutcome, Dispatcher};

/// Environment key receiving the remote user.
pub const PRINCIPAL_KEY: &str = "security.principal";
/// Environment key receiving the remote password.
pub const CREDENTIALS_KEY: &str = "security.credentials";
/// Environment key receiving `[user, password]`.
pub const REMOTE_CREDENTIALS_KEY: &str = "remote.credentials";

/// Translates target options into the connector environment.
///
/// User and password options are removed and, when both are present,
/// re-issued under the principal and credential keys plus a combined
/// credentials array. Maps without credentials pass through unchanged.
pub fn prepare_environment(options: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let mut environment = options.clone();
    let user = environment.remove(USER_OPTION);
    let password = environment.remove(PASSWORD_OPTION);
    if let (Some(user), Some(password)) = (user, password) {
        environment.insert(
            REMOTE_CREDENTIALS_KEY.to_owned(),
            Value::Array(vec![user.clone(), password.clone()]),
        );
        environment.insert(PRINCIPAL_KEY.to_owned(), user);
        environment.insert(CREDENTIALS_KEY.to_owned(), password);
    }
    environment
}

/// Proxies requests carrying a remote target to that target.
///
/// A connection is opened per request and closed on every exit path.
pub struct RemoteDispatcher {
    handlers: HandlerRegistry,
    connector: Arc<dyn Connector>,
    converter: ValueConverter,
}

impl RemoteDispatcher {
    /// Creates a dispatcher with its own handler registry.
    pub fn new(
        restrictor: Arc<dyn Restrictor>,
        connector: Arc<dyn Connector>,
        converter: ValueConverter,
    ) -> Self {
        Self {
            handlers: HandlerRegistry::new(restrictor),
            connector,
            converter,
        }
    }
}

impl Dispatcher for RemoteDispatcher {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn can_handle(&self, request: &ManagementRequest) -> bool {
        request.target().is_some()
    }

    fn dispatch(&self, request: &ManagementRequest) -> Result<DispatchOutcome, GatewayError> {
        let target = request
            .target()
            .ok_or_else(|| GatewayError::malformed("request carries no remote target"))?;
        let handler = self.handlers.resolve(request.request_type())?;
        let url = target.url();

        let environment = prepare_environment(target.options());
        debug!(target: DISPATCH_TARGET, url, "opening remote connection");
        let connection = self
            .connector
            .connect(url, &environment)
            .map_err(|error| GatewayError::from_remote(url, error))?;
        let guard = ConnectionGuard::new(connection, url);
        let connection = guard
            .connection()
            .ok_or_else(|| GatewayError::internal("remote connection released early"))?;

        let raw = if handler.handles_all_targets_at_once(request) {
            handler.handle_all(request, &[connection])?
        } else {
            handler.handle(request, connection)?
        };
        guard
            .release()
            .map_err(|error| GatewayError::from_remote(url, error))?;

        let value =
            self.converter
                .convert(raw, request.path(), handler.uses_path_on_return_value())?;
        Ok(DispatchOutcome::value(value))
    }
}

impl fmt::Debug for RemoteDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteDispatcher")
            .field("handlers", &self.handlers)
            .field("converter", &self.converter)
            .finish_non_exhaustive()
    }
}
