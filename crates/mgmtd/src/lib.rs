//! Management gateway core.
//!
//! The gateway accepts management requests (read, write, exec, list,
//! version and search) against a directory of named resources and answers
//! each with a [`ResponseEnvelope`](mgmt_types::ResponseEnvelope). A request
//! flows through the [`ExecutionPipeline`]:
//!
//! 1. The [`DispatcherChain`](dispatch::DispatcherChain) picks the first
//!    dispatcher accepting the request. Requests carrying a remote target are
//!    proxied by the [`RemoteDispatcher`](dispatch::RemoteDispatcher); the
//!    [`LocalDispatcher`](dispatch::LocalDispatcher) always runs last.
//! 2. The chosen dispatcher resolves a [`RequestHandler`](handler::RequestHandler)
//!    by request type. Handlers consult the [`Restrictor`] before touching
//!    the directory.
//! 3. Results pass through the [`ValueConverter`], then the
//!    [`HistoryStore`](history::HistoryStore) records tracked values and
//!    attaches earlier ones.
//!
//! Failures are translated into failure envelopes carrying a status and an
//! error type. Only fatal failures, such as a request no dispatcher accepts,
//! escape as [`GatewayError`]s. The [`JsonFrontend`] decodes single and bulk
//! JSON bodies and keeps one envelope per request, in request order.
//!
//! # Embedding
//!
//! The gateway logs through `tracing` but installs no subscriber of its own.
//! A host process resolves its [`Config`](mgmt_config::Config), installs
//! logging with [`telemetry::initialise`], then builds the pipeline from the
//! same configuration:
//!
//! ```
//! use mgmt_config::Config;
//! use mgmtd::{ExecutionPipeline, ManagementRequest, telemetry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! telemetry::initialise(&config)?;
//! let pipeline = ExecutionPipeline::from_config(&config, Vec::new(), None)?;
//!
//! let envelope = pipeline.execute_one(&ManagementRequest::version())?;
//! assert_eq!(envelope.status, 200);
//! # Ok(())
//! # }
//! ```

mod converter;
mod directory;
pub mod dispatch;
mod errors;
mod frontend;
pub mod handler;
pub mod history;
mod pipeline;
mod request;
mod restrictor;
pub mod telemetry;

pub use converter::{ValueConverter, extract_path, parse_path, replace_at_path};
pub use directory::{
    AttributeInfo, ConnectionGuard, Connector, DirectoryConnection, DirectoryError, OperationInfo,
    ParameterInfo, RemoteConnection, ResourceInfo,
};
pub use errors::{BoxError, GatewayError};
pub use frontend::JsonFrontend;
pub use pipeline::{ExecutionPipeline, PipelineBuilder};
pub use request::{ManagementRequest, PASSWORD_OPTION, RemoteTarget, USER_OPTION};
pub use restrictor::{AllowAllRestrictor, DenyAllRestrictor, Restrictor, restrictor_for};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
