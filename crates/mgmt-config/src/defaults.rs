use crate::logging::LogFormat;

/// Default log filter expression used by the gateway.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default ceiling for values remembered per history key.
pub const DEFAULT_HISTORY_MAX_ENTRIES: usize = 10;

/// Default log filter expression used by the gateway.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default global history ceiling.
pub fn default_history_max_entries() -> usize {
    DEFAULT_HISTORY_MAX_ENTRIES
}
