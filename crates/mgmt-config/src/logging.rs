//! Log output selection.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the gateway renders log events on stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One flattened JSON object per event, for log shippers.
    #[default]
    Json,
    /// Single-line text for terminals. Also accepted as `text`.
    #[serde(alias = "text")]
    #[strum(to_string = "compact", serialize = "text")]
    Compact,
}

impl LogFormat {
    /// Returns `true` when events are emitted as machine-readable records.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Error raised when text names no [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("COMPACT", LogFormat::Compact)]
    #[case("text", LogFormat::Compact)]
    fn parses_format_names(#[case] text: &str, #[case] expected: LogFormat) {
        assert_eq!(LogFormat::from_str(text), Ok(expected));
    }

    #[rstest]
    fn text_alias_displays_canonical_name() {
        assert_eq!(LogFormat::Compact.to_string(), "compact");
        assert!(!LogFormat::Compact.is_structured());
        assert!(LogFormat::Json.is_structured());
    }

    #[rstest]
    fn unknown_format_is_rejected() {
        assert!(LogFormat::from_str("xml").is_err());
    }
}
