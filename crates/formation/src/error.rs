//! Error types and error-message collections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Formation-specific errors.
///
/// Rendering never returns these: a missing label, error or option degrades
/// to empty markup. They only surface from configuration loading and from
/// helpers that are handed malformed input directly.
#[derive(Debug, Error)]
pub enum FormationError {
    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A pattern supplied to a helper did not compile.
    #[error("invalid pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A date format cannot be rendered for dates without a time zone.
    #[error("invalid date format: {0}")]
    InvalidDateFormat(String),

    /// A field kind name was not recognised.
    #[error("unknown field kind: {0}")]
    UnknownFieldKind(String),
}

/// Result type alias for formation operations.
pub type Result<T> = std::result::Result<T, FormationError>;

/// Validation failure messages keyed by dotted field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorMap {
    messages: BTreeMap<String, String>,
}

impl ErrorMap {
    /// Creates a new empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message for a field, replacing any previous one.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.messages.insert(field.into(), message.into());
    }

    /// Returns the message for a field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.messages.get(field).map(String::as_str)
    }

    /// Returns whether a message exists for a field.
    pub fn contains(&self, field: &str) -> bool {
        self.messages.contains_key(field)
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Returns whether there are any messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the number of fields with a message.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Iterates over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.messages
            .iter()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }

    /// Returns the underlying map.
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.messages
    }
}

impl std::fmt::Display for ErrorMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (field, message) in &self.messages {
            writeln!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

impl FromIterator<(String, String)> for ErrorMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

/// Errors persisted in the session by a previous request.
///
/// Either a plain field → message map, or a set of named bags holding every
/// message per field (only the first message of the `default` bag is used).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PersistedErrors {
    /// Named bags of field → messages.
    Bags(BTreeMap<String, BTreeMap<String, Vec<String>>>),
    /// Field → message.
    Flat(BTreeMap<String, String>),
}

impl PersistedErrors {
    /// Name of the bag read from [`PersistedErrors::Bags`].
    pub const DEFAULT_BAG: &'static str = "default";

    /// Returns the `(field, first message)` pairs this session carries.
    pub fn first_messages(&self) -> Vec<(String, String)> {
        match self {
            Self::Flat(map) => map
                .iter()
                .map(|(field, message)| (field.clone(), message.clone()))
                .collect(),
            Self::Bags(bags) => bags
                .get(Self::DEFAULT_BAG)
                .map(|bag| {
                    bag.iter()
                        .filter_map(|(field, messages)| {
                            messages.first().map(|m| (field.clone(), m.clone()))
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}
