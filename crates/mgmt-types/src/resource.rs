//! Structured resource names.
//!
//! A resource is identified by a domain and a set of `key=value` properties,
//! written as `domain:key=value,key2=value2`. Names may be patterns: the domain
//! and property values accept `*` and `?` wildcards, and a bare `*` entry in the
//! property list (for example `app:type=cache,*`) matches names carrying any
//! additional properties.
//!
//! Property order is not significant. The canonical form sorts properties by
//! key, which is also the form used for display, equality and hashing.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing a [`ResourceName`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceNameError {
    /// The domain separator (`:`) was missing.
    #[error("resource name '{0}' is missing the domain separator ':'")]
    MissingDomainSeparator(String),
    /// The domain part was empty.
    #[error("resource name '{0}' has an empty domain")]
    EmptyDomain(String),
    /// No properties were given and the name is not a property-list pattern.
    #[error("resource name '{0}' has no properties")]
    NoProperties(String),
    /// A property lacked the `=` assignment or had an empty key or value.
    #[error("resource name '{name}' has a malformed property '{property}'")]
    MalformedProperty {
        /// Full name being parsed.
        name: String,
        /// Offending property text.
        property: String,
    },
    /// A property key was given twice.
    #[error("resource name '{name}' repeats the property key '{key}'")]
    DuplicateKey {
        /// Full name being parsed.
        name: String,
        /// Repeated key.
        key: String,
    },
}

/// Structured, possibly wildcarded, resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName {
    domain: String,
    properties: BTreeMap<String, String>,
    property_list_pattern: bool,
}

impl ResourceName {
    /// Parses a resource name from its textual form.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceNameError`] describing the first syntax problem.
    pub fn parse(input: &str) -> Result<Self, ResourceNameError> {
        let trimmed = input.trim();
        let (domain, property_list) = trimmed
            .split_once(':')
            .ok_or_else(|| ResourceNameError::MissingDomainSeparator(trimmed.to_owned()))?;
        if domain.is_empty() {
            return Err(ResourceNameError::EmptyDomain(trimmed.to_owned()));
        }

        let mut properties = BTreeMap::new();
        let mut property_list_pattern = false;
        for property in property_list.split(',').map(str::trim) {
            if property == "*" {
                property_list_pattern = true;
                continue;
            }
            let (key, value) = property
                .split_once('=')
                .filter(|(key, value)| !key.is_empty() && !value.is_empty())
                .filter(|(key, _)| !contains_wildcard(key))
                .ok_or_else(|| ResourceNameError::MalformedProperty {
                    name: trimmed.to_owned(),
                    property: property.to_owned(),
                })?;
            if properties
                .insert(key.to_owned(), value.to_owned())
                .is_some()
            {
                return Err(ResourceNameError::DuplicateKey {
                    name: trimmed.to_owned(),
                    key: key.to_owned(),
                });
            }
        }

        if properties.is_empty() && !property_list_pattern {
            return Err(ResourceNameError::NoProperties(trimmed.to_owned()));
        }

        Ok(Self {
            domain: domain.to_owned(),
            properties,
            property_list_pattern,
        })
    }

    /// Domain part of the name.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the value of a property, when present.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Iterates over the properties in canonical (key-sorted) order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Returns `true` when the name contains any wildcard.
    #[must_use]
    pub fn is_pattern(&self) -> bool {
        self.property_list_pattern
            || contains_wildcard(&self.domain)
            || self.properties.values().any(|value| contains_wildcard(value))
    }

    /// Returns `true` when `other` is covered by this name.
    ///
    /// An exact name only matches itself. A pattern matches when the domain
    /// glob matches, every pattern property is present in `other` with a
    /// matching value, and (unless this is a property-list pattern) `other`
    /// carries no additional properties.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        if !self.is_pattern() {
            return self == other;
        }
        if !glob_match(&self.domain, &other.domain) {
            return false;
        }
        let covered = self.properties.iter().all(|(key, pattern)| {
            other
                .properties
                .get(key)
                .is_some_and(|value| glob_match(pattern, value))
        });
        covered && (self.property_list_pattern || self.properties.len() == other.properties.len())
    }

    /// Canonical textual form with properties sorted by key.
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut entries: Vec<String> = self
            .properties
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        if self.property_list_pattern {
            entries.push(String::from("*"));
        }
        format!("{}:{}", self.domain, entries.join(","))
    }

    /// Property part of the canonical form (everything after the domain).
    #[must_use]
    pub fn canonical_properties(&self) -> String {
        let canonical = self.canonical();
        canonical
            .split_once(':')
            .map(|(_, properties)| properties.to_owned())
            .unwrap_or_default()
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.canonical())
    }
}

impl FromStr for ResourceName {
    type Err = ResourceNameError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl TryFrom<String> for ResourceName {
    type Error = ResourceNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceName> for String {
    fn from(name: ResourceName) -> Self {
        name.canonical()
    }
}

fn contains_wildcard(text: &str) -> bool {
    text.contains(['*', '?'])
}

/// Matches `text` against a `*`/`?` glob.
///
/// Backtracks only to the most recent `*`, so the cost stays within
/// `pattern.len() * text.len()` steps however many stars the pattern holds.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let mut p = 0;
    let mut t = 0;
    let mut last_star: Option<(usize, usize)> = None;
    while t < text.len() {
        match (pattern.get(p), text.get(t)) {
            (Some('*'), _) => {
                last_star = Some((p, t));
                p += 1;
            }
            (Some('?'), _) => {
                p += 1;
                t += 1;
            }
            (Some(expected), Some(actual)) if expected == actual => {
                p += 1;
                t += 1;
            }
            _ => match last_star {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    last_star = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    pattern.get(p..).is_some_and(|rest| rest.iter().all(|c| *c == '*'))
}
