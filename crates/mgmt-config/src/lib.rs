//! Shared configuration for the management gateway.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then an
//! optional configuration file (`--config-path` or `MGMT_CONFIG_PATH`), then
//! `MGMT_*` environment variables, and finally command-line flags. Later layers
//! override earlier ones field by field.

mod defaults;
mod logging;
mod restrictor;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_HISTORY_MAX_ENTRIES, DEFAULT_LOG_FILTER, default_history_max_entries,
    default_log_filter, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use restrictor::{RestrictorKind, RestrictorKindParseError};

/// Resolved gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "MGMT")]
pub struct Config {
    /// `tracing` filter expression applied to the subscriber.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Output format for structured logs.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
    /// Hard ceiling on the number of values kept per history key.
    #[serde(default = "defaults::default_history_max_entries")]
    pub history_max_entries: usize,
    /// Enables stack traces in failure envelopes and verbose request logging.
    #[serde(default)]
    pub debug: bool,
    /// Maximum traversal depth when converting results (0 disables the limit).
    #[serde(default)]
    pub max_depth: usize,
    /// Maximum number of elements kept per array or object (0 disables the limit).
    #[serde(default)]
    pub max_collection_size: usize,
    /// Built-in access restrictor applied to every request.
    #[serde(default)]
    pub restrictor: RestrictorKind,
    /// Additional dispatcher tokens consulted before the local dispatcher.
    #[serde(default)]
    pub dispatchers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            history_max_entries: default_history_max_entries(),
            debug: false,
            max_depth: 0,
            max_collection_size: 0,
            restrictor: RestrictorKind::default(),
            dispatchers: Vec::new(),
        }
    }
}

impl Config {
    /// Filter expression for the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format for structured logs.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Global history ceiling.
    #[must_use]
    pub fn history_max_entries(&self) -> usize {
        self.history_max_entries
    }

    /// Whether debug mode is enabled.
    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Converter depth limit, `None` when unlimited.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        non_zero(self.max_depth)
    }

    /// Converter collection-size limit, `None` when unlimited.
    #[must_use]
    pub fn max_collection_size(&self) -> Option<usize> {
        non_zero(self.max_collection_size)
    }

    /// Built-in restrictor selection.
    #[must_use]
    pub fn restrictor(&self) -> RestrictorKind {
        self.restrictor
    }

    /// Dispatcher tokens, trimmed and with empty entries removed.
    #[must_use]
    pub fn dispatcher_tokens(&self) -> Vec<&str> {
        self.dispatchers
            .iter()
            .map(|token| token.trim())
            .filter(|token| !token.is_empty())
            .collect()
    }
}

fn non_zero(value: usize) -> Option<usize> {
    (value > 0).then_some(value)
}
