//! Log subscriber installation for processes embedding the gateway.
//!
//! The pipeline only emits `tracing` events under the `mgmtd::*` targets and
//! never installs a subscriber itself. A host process calls [`initialise`]
//! once at startup with the same [`Config`] it builds the pipeline from; see
//! the crate documentation for the full sequence.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use mgmt_config::Config;

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Proof that the process-wide subscriber is in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Failure to set up gateway logging.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `log_filter` is not a valid filter directive list.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// The rejected directives.
        filter: String,
        /// Why they were rejected.
        message: String,
    },
    /// Another subscriber already owns the process.
    #[error("failed to install log subscriber: {0}")]
    Subscriber(#[source] SetGlobalDefaultError),
}

/// Installs the subscriber described by `config` for the whole process.
///
/// Only the first successful call installs anything; later calls return a
/// handle straight away, whatever configuration they pass.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparseable `log_filter`, and
/// [`TelemetryError::Subscriber`] when some other subscriber was installed
/// first.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            let subscriber = subscriber_for(config, io::stderr().is_terminal())?;
            tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
        })
        .map(|_| TelemetryHandle)
}

/// Builds the stderr subscriber for `config` without installing it.
fn subscriber_for(
    config: &Config,
    ansi: bool,
) -> Result<Box<dyn Subscriber + Send + Sync>, TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter {
        filter: config.log_filter().to_owned(),
        message: error.to_string(),
    })?;
    let events = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    if config.log_format().is_structured() {
        Ok(Box::new(
            events
                .with_ansi(false)
                .json()
                .flatten_event(true)
                .finish(),
        ))
    } else {
        Ok(Box::new(events.with_ansi(ansi).compact().finish()))
    }
}
