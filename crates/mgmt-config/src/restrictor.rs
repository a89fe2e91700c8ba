use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Built-in access restrictors selectable from configuration.
///
/// Policy-driven restrictors are supplied programmatically by embedding
/// applications; configuration only chooses between the two fixed policies.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RestrictorKind {
    /// Permit every request.
    #[default]
    AllowAll,
    /// Refuse every request.
    DenyAll,
}

/// Errors encountered while parsing a [`RestrictorKind`] from text.
pub type RestrictorKindParseError = strum::ParseError;
