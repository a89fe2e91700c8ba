use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::converter::ValueConverter;
use crate::directory::Connector;
use crate::errors::GatewayError;
use crate::restrictor::Restrictor;

use super::{Dispatcher, RemoteDispatcher};

/// Collaborators available to dispatcher constructors.
#[derive(Clone)]
pub struct DispatcherContext {
    /// Restrictor shared by every handler registry.
    pub restrictor: Arc<dyn Restrictor>,
    /// Result shaping applied after handlers run.
    pub converter: ValueConverter,
    /// Connector for remote targets, when one is installed.
    pub connector: Option<Arc<dyn Connector>>,
}

impl fmt::Debug for DispatcherContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherContext")
            .field("converter", &self.converter)
            .field("connector", &self.connector.is_some())
            .finish_non_exhaustive()
    }
}

/// Builds a dispatcher from the shared context.
pub type DispatcherConstructor = fn(&DispatcherContext) -> Result<Box<dyn Dispatcher>, GatewayError>;

/// Compile-time table mapping configuration tokens to dispatcher constructors.
#[derive(Clone)]
pub struct DispatcherRegistry {
    constructors: BTreeMap<&'static str, DispatcherConstructor>,
}

impl DispatcherRegistry {
    /// Registry containing the built-in `remote` dispatcher.
    pub fn builtin() -> Self {
        let mut registry = Self {
            constructors: BTreeMap::new(),
        };
        registry.register("remote", construct_remote);
        registry
    }

    /// Adds or replaces the constructor for `token`.
    pub fn register(&mut self, token: &'static str, constructor: DispatcherConstructor) {
        self.constructors.insert(token, constructor);
    }

    /// Returns the registered tokens in sorted order.
    pub fn tokens(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }

    /// Builds the dispatchers named by `tokens`, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownDispatcher`] for an unregistered token,
    /// or the constructor's own error.
    pub fn build(
        &self,
        tokens: &[&str],
        context: &DispatcherContext,
    ) -> Result<Vec<Box<dyn Dispatcher>>, GatewayError> {
        tokens
            .iter()
            .map(|token| {
                let constructor = self
                    .constructors
                    .get(*token)
                    .ok_or_else(|| GatewayError::unknown_dispatcher(*token))?;
                constructor(context)
            })
            .collect()
    }
}

impl Default for DispatcherRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for DispatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherRegistry")
            .field("tokens", &self.tokens())
            .finish()
    }
}

fn construct_remote(context: &DispatcherContext) -> Result<Box<dyn Dispatcher>, GatewayError> {
    let connector = context.connector.clone().ok_or_else(|| {
        GatewayError::configuration("the remote dispatcher needs a connector")
    })?;
    Ok(Box::new(RemoteDispatcher::new(
        Arc::clone(&context.restrictor),
        connector,
        context.converter,
    )))
}
