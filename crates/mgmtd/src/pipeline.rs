//! The execution pipeline: dispatch, history, status stamping and error
//! translation for single and bulk requests.

use std::fmt;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, error, warn};

use mgmt_config::{Config, DEFAULT_HISTORY_MAX_ENTRIES};
use mgmt_types::{ResponseEnvelope, STATUS_OK};

use crate::converter::ValueConverter;
use crate::directory::{Connector, DirectoryConnection};
use crate::dispatch::{
    Dispatcher, DispatcherChain, DispatcherContext, DispatcherRegistry, LocalDispatcher,
};
use crate::errors::GatewayError;
use crate::history::HistoryStore;
use crate::request::ManagementRequest;
use crate::restrictor::{AllowAllRestrictor, Restrictor, restrictor_for};

/// Tracing target for pipeline execution.
pub(crate) const PIPELINE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::pipeline");

/// Seconds since the Unix epoch.
pub(crate) fn now_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

/// Executes requests and produces response envelopes.
///
/// The dispatcher chain is fixed at construction. The history store is the
/// only shared mutable state and is exposed for administration through
/// [`ExecutionPipeline::history`].
pub struct ExecutionPipeline {
    chain: DispatcherChain,
    history: Arc<HistoryStore>,
    restrictor: Arc<dyn Restrictor>,
    debug: bool,
}

impl ExecutionPipeline {
    /// Starts a builder with default collaborators.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Builds a pipeline from configuration and the supplied collaborators.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`GatewayError`] when a configured dispatcher token is
    /// unknown or cannot be constructed.
    pub fn from_config(
        config: &Config,
        directories: Vec<Arc<dyn DirectoryConnection>>,
        connector: Option<Arc<dyn Connector>>,
    ) -> Result<Self, GatewayError> {
        let mut builder = PipelineBuilder::from_config(config).directories(directories);
        if let Some(connector) = connector {
            builder = builder.connector(connector);
        }
        builder.build()
    }

    /// Returns the shared history store.
    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Returns the dispatcher names in chain order.
    pub fn dispatcher_names(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    /// Returns `true` when failure envelopes carry error chains.
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Returns `true` when the restrictor admits a client.
    pub fn is_remote_access_allowed(&self, host: &str, address: &str) -> bool {
        self.restrictor.is_remote_access_allowed(host, address)
    }

    /// Executes one request.
    ///
    /// Non-fatal failures become failure envelopes; successful envelopes
    /// carry a timestamp, any tracked history and status 200 unless the
    /// dispatcher chose another status.
    ///
    /// # Errors
    ///
    /// Returns fatal [`GatewayError`]s such as
    /// [`GatewayError::NoDispatcher`] unchanged.
    pub fn execute_one(
        &self,
        request: &ManagementRequest,
    ) -> Result<ResponseEnvelope, GatewayError> {
        if let Err(error) = request.validate() {
            return Ok(self.translate(&error));
        }

        let started = Instant::now();
        debug!(target: PIPELINE_TARGET, request = %request, "executing request");

        match self.chain.dispatch(request) {
            Ok(outcome) => {
                let mut envelope = ResponseEnvelope::with_status(
                    outcome.value,
                    outcome.status.unwrap_or(STATUS_OK),
                );
                self.history
                    .record_and_annotate(request, &mut envelope, now_seconds());
                if self.debug {
                    debug!(
                        target: PIPELINE_TARGET,
                        request = %request,
                        elapsed_ms = started.elapsed().as_millis(),
                        response = ?envelope,
                        "request executed"
                    );
                }
                Ok(envelope)
            }
            Err(failure) if failure.is_fatal() => {
                error!(
                    target: PIPELINE_TARGET,
                    request = %request,
                    error = %failure,
                    "fatal dispatch failure"
                );
                Err(failure)
            }
            Err(failure) => {
                warn!(
                    target: PIPELINE_TARGET,
                    request = %request,
                    error = %failure,
                    status = failure.status(),
                    "request failed"
                );
                Ok(self.translate(&failure))
            }
        }
    }

    /// Executes requests in order, producing one envelope per request.
    ///
    /// # Errors
    ///
    /// Stops at the first fatal [`GatewayError`].
    pub fn execute_many(
        &self,
        requests: &[ManagementRequest],
    ) -> Result<Vec<ResponseEnvelope>, GatewayError> {
        requests
            .iter()
            .map(|request| self.execute_one(request))
            .collect()
    }

    /// Turns a non-fatal error into a timestamped failure envelope.
    pub fn translate(&self, error: &GatewayError) -> ResponseEnvelope {
        let stacktrace = self.debug.then(|| error.render_chain());
        let mut envelope = ResponseEnvelope::failure(
            error.status(),
            error.error_type(),
            error.to_string(),
            stacktrace,
        );
        envelope.timestamp = Some(now_seconds());
        envelope
    }
}

impl fmt::Debug for ExecutionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionPipeline")
            .field("chain", &self.chain)
            .field("history", &self.history)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

/// Assembles an [`ExecutionPipeline`].
pub struct PipelineBuilder {
    restrictor: Arc<dyn Restrictor>,
    directories: Vec<Arc<dyn DirectoryConnection>>,
    connector: Option<Arc<dyn Connector>>,
    registry: DispatcherRegistry,
    dispatcher_tokens: Vec<String>,
    extra_dispatchers: Vec<Box<dyn Dispatcher>>,
    converter: ValueConverter,
    history_max_entries: usize,
    debug: bool,
}

impl PipelineBuilder {
    /// Creates a builder with the allow-all restrictor and no directories.
    pub fn new() -> Self {
        Self {
            restrictor: Arc::new(AllowAllRestrictor),
            directories: Vec::new(),
            connector: None,
            registry: DispatcherRegistry::builtin(),
            dispatcher_tokens: Vec::new(),
            extra_dispatchers: Vec::new(),
            converter: ValueConverter::default(),
            history_max_entries: DEFAULT_HISTORY_MAX_ENTRIES,
            debug: false,
        }
    }

    /// Creates a builder seeded from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            restrictor: restrictor_for(config.restrictor()),
            dispatcher_tokens: config
                .dispatcher_tokens()
                .into_iter()
                .map(str::to_owned)
                .collect(),
            converter: ValueConverter::new(config.max_depth(), config.max_collection_size()),
            history_max_entries: config.history_max_entries(),
            debug: config.debug(),
            ..Self::new()
        }
    }

    /// Replaces the restrictor.
    #[must_use]
    pub fn restrictor(mut self, restrictor: Arc<dyn Restrictor>) -> Self {
        self.restrictor = restrictor;
        self
    }

    /// Appends a local directory.
    #[must_use]
    pub fn directory(mut self, directory: Arc<dyn DirectoryConnection>) -> Self {
        self.directories.push(directory);
        self
    }

    /// Appends several local directories.
    #[must_use]
    pub fn directories(mut self, directories: Vec<Arc<dyn DirectoryConnection>>) -> Self {
        self.directories.extend(directories);
        self
    }

    /// Installs the connector used for remote targets.
    #[must_use]
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Replaces the dispatcher token registry.
    #[must_use]
    pub fn registry(mut self, registry: DispatcherRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Appends a dispatcher token, resolved through the registry on build.
    #[must_use]
    pub fn dispatcher_token(mut self, token: impl Into<String>) -> Self {
        self.dispatcher_tokens.push(token.into());
        self
    }

    /// Appends a ready-made dispatcher after the token-built ones.
    #[must_use]
    pub fn dispatcher(mut self, dispatcher: Box<dyn Dispatcher>) -> Self {
        self.extra_dispatchers.push(dispatcher);
        self
    }

    /// Replaces the result converter.
    #[must_use]
    pub fn converter(mut self, converter: ValueConverter) -> Self {
        self.converter = converter;
        self
    }

    /// Sets the global history ceiling.
    #[must_use]
    pub fn history_max_entries(mut self, max_entries: usize) -> Self {
        self.history_max_entries = max_entries;
        self
    }

    /// Enables error chains in failure envelopes and timing logs.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownDispatcher`] for an unregistered token
    /// and [`GatewayError::Configuration`] when a dispatcher lacks a
    /// collaborator it needs.
    pub fn build(self) -> Result<ExecutionPipeline, GatewayError> {
        let context = DispatcherContext {
            restrictor: Arc::clone(&self.restrictor),
            converter: self.converter,
            connector: self.connector,
        };
        let tokens: Vec<&str> = self.dispatcher_tokens.iter().map(String::as_str).collect();
        let mut dispatchers = self.registry.build(&tokens, &context)?;
        dispatchers.extend(self.extra_dispatchers);

        let local = LocalDispatcher::new(
            Arc::clone(&self.restrictor),
            self.directories,
            self.converter,
        );
        let chain = DispatcherChain::new(dispatchers, local);
        debug!(
            target: PIPELINE_TARGET,
            dispatchers = ?chain.names(),
            history_max_entries = self.history_max_entries,
            debug = self.debug,
            "pipeline assembled"
        );

        Ok(ExecutionPipeline {
            chain,
            history: Arc::new(HistoryStore::new(self.history_max_entries)),
            restrictor: self.restrictor,
            debug: self.debug,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
