use std::fmt;

use tracing::debug;

use crate::errors::GatewayError;
use crate::request::ManagementRequest;

use super::{DISPATCH_TARGET, DispatchOutcome, Dispatcher, LocalDispatcher};

/// Ordered dispatchers, local last.
pub struct DispatcherChain {
    dispatchers: Vec<Box<dyn Dispatcher>>,
}

impl DispatcherChain {
    /// Builds a chain of `extra` dispatchers in order, followed by `local`.
    pub fn new(extra: Vec<Box<dyn Dispatcher>>, local: LocalDispatcher) -> Self {
        let mut dispatchers = extra;
        dispatchers.push(Box::new(local));
        Self { dispatchers }
    }

    /// Builds a chain from an explicit list, without appending a catch-all.
    pub fn from_dispatchers(dispatchers: Vec<Box<dyn Dispatcher>>) -> Self {
        Self { dispatchers }
    }

    /// Returns the dispatcher names in chain order.
    pub fn names(&self) -> Vec<&'static str> {
        self.dispatchers.iter().map(|dispatcher| dispatcher.name()).collect()
    }

    /// Routes `request` to the first dispatcher that accepts it.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's error, or the fatal
    /// [`GatewayError::NoDispatcher`] when nothing accepts the request.
    pub fn dispatch(&self, request: &ManagementRequest) -> Result<DispatchOutcome, GatewayError> {
        let dispatcher = self
            .dispatchers
            .iter()
            .find(|dispatcher| dispatcher.can_handle(request))
            .ok_or_else(|| GatewayError::no_dispatcher(request.request_type()))?;
        debug!(
            target: DISPATCH_TARGET,
            dispatcher = dispatcher.name(),
            request = %request,
            "routing request"
        );
        dispatcher.dispatch(request)
    }
}

impl fmt::Debug for DispatcherChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherChain")
            .field("dispatchers", &self.names())
            .finish()
    }
}
