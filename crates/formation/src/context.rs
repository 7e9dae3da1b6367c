//! The per-request rendering context.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::FormationConfig;
use crate::error::{ErrorMap, PersistedErrors};
use crate::path::strip_suppression;
use crate::tree::ValueTree;
use crate::validation::{RuleSet, RuleValidatorFactory, ValidationGroup, ValidatorFactory};

/// What the current request carries: the submitted input, the input
/// flashed by the previous request, and the errors it persisted.
#[derive(Debug, Clone, Default)]
pub struct RequestData {
    /// Submitted input.
    pub input: ValueTree,
    /// Input flashed by the previous request.
    pub old: ValueTree,
    /// Errors persisted by the previous request.
    pub errors: Option<PersistedErrors>,
}

impl RequestData {
    /// Creates empty request data (a plain page view).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the submitted input.
    #[must_use]
    pub fn with_input(mut self, input: ValueTree) -> Self {
        self.input = input;
        self
    }

    /// Sets the submitted input from raw `name=value` pairs.
    #[must_use]
    pub fn with_form_pairs<K, V>(self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        self.with_input(ValueTree::from_form_pairs(pairs))
    }

    /// Sets the flashed input.
    #[must_use]
    pub fn with_old(mut self, old: ValueTree) -> Self {
        self.old = old;
        self
    }

    /// Sets the persisted errors.
    #[must_use]
    pub fn with_errors(mut self, errors: PersistedErrors) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Returns whether this request is a form submission.
    pub fn is_submission(&self) -> bool {
        !self.input.is_empty()
    }
}

/// One request's form state: labels, claimed access keys, defaults, declared
/// rules, validation groups and the error map.
///
/// Create one per request. Reusing a value across requests leaks access keys
/// and cached errors; call [`Formation::reset_session`] if a value must be
/// recycled.
pub struct Formation {
    pub(crate) config: Arc<FormationConfig>,
    pub(crate) request: RequestData,
    pub(crate) defaults: BTreeMap<String, ValueTree>,
    pub(crate) labels: BTreeMap<String, String>,
    pub(crate) access_keys: BTreeMap<char, String>,
    pub(crate) errors: ErrorMap,
    pub(crate) groups: BTreeMap<String, ValidationGroup>,
    pub(crate) rules: BTreeMap<String, RuleSet>,
    pub(crate) validation_fields: Vec<String>,
    pub(crate) default_errors: BTreeMap<String, String>,
    pub(crate) reset: bool,
    pub(crate) factory: Box<dyn ValidatorFactory>,
}

impl fmt::Debug for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formation")
            .field("config", &self.config)
            .field("request", &self.request)
            .field("defaults", &self.defaults)
            .field("labels", &self.labels)
            .field("access_keys", &self.access_keys)
            .field("errors", &self.errors)
            .field("groups", &self.groups)
            .field("reset", &self.reset)
            .finish_non_exhaustive()
    }
}

impl Formation {
    /// Creates a context for one request.
    ///
    /// Errors persisted by the previous request are loaded immediately.
    pub fn new(config: impl Into<Arc<FormationConfig>>, request: RequestData) -> Self {
        let mut formation = Self {
            config: config.into(),
            request,
            defaults: BTreeMap::new(),
            labels: BTreeMap::new(),
            access_keys: BTreeMap::new(),
            errors: ErrorMap::new(),
            groups: BTreeMap::new(),
            rules: BTreeMap::new(),
            validation_fields: Vec::new(),
            default_errors: BTreeMap::new(),
            reset: false,
            factory: Box::new(RuleValidatorFactory::new()),
        };
        formation.load_session_errors();
        formation
    }

    /// Replaces the validator factory used for validation groups.
    #[must_use]
    pub fn with_validator_factory(mut self, factory: impl ValidatorFactory + 'static) -> Self {
        self.factory = Box::new(factory);
        for group in self.groups.values_mut() {
            group.reset();
        }
        self
    }

    /// Returns the configuration snapshot.
    pub fn config(&self) -> &FormationConfig {
        &self.config
    }

    /// Returns the request data.
    pub fn request(&self) -> &RequestData {
        &self.request
    }

    /// Returns whether the current request is a form submission.
    pub fn is_submission(&self) -> bool {
        self.request.is_submission()
    }

    /// Starts over for a new render: labels, access keys, error messages and
    /// validation outcomes are cleared, then persisted errors are re-read.
    pub fn reset_session(&mut self) {
        self.labels.clear();
        self.access_keys.clear();
        self.errors.clear();
        for group in self.groups.values_mut() {
            group.reset();
        }
        self.load_session_errors();
    }

    /// Registers labels for field names, merged over earlier ones.
    pub fn set_labels<K, V>(&mut self, labels: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, label) in labels {
            self.labels
                .insert(strip_suppression(name.as_ref()), label.into());
        }
    }

    /// Returns the registered labels.
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Returns the access keys claimed so far, keyed by character.
    pub fn access_keys(&self) -> &BTreeMap<char, String> {
        &self.access_keys
    }

    /// Returns the declared rules for a field.
    pub fn rules_for(&self, name: &str) -> Option<&RuleSet> {
        self.rules.get(&strip_suppression(name))
    }

    /// Returns the validation groups.
    pub fn validation_groups(&self) -> &BTreeMap<String, ValidationGroup> {
        &self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = RequestData::new().with_form_pairs([("name", "Ann")]);
        assert!(request.is_submission());
        assert!(!RequestData::new().is_submission());
    }

    #[test]
    fn test_new_loads_persisted_errors() {
        let persisted: PersistedErrors =
            serde_json::from_str(r#"{"email": "Invalid email"}"#).unwrap();
        let formation = Formation::new(
            FormationConfig::default(),
            RequestData::new().with_errors(persisted),
        );
        assert_eq!(formation.errors.get("email"), Some("Invalid email"));
    }

    #[test]
    fn test_reset_session_clears_state() {
        let mut formation = Formation::new(FormationConfig::default(), RequestData::new());
        formation.set_labels([("name", "Full Name")]);
        formation.access_keys.insert('f', "name".to_string());
        formation.errors.insert("name", "Bad");

        formation.reset_session();

        assert!(formation.labels().is_empty());
        assert!(formation.access_keys().is_empty());
        assert!(formation.errors.is_empty());
    }

    #[test]
    fn test_labels_keyed_without_suppression() {
        let mut formation = Formation::new(FormationConfig::default(), RequestData::new());
        formation.set_labels([("items.(1).name", "Item Name")]);
        assert_eq!(
            formation.labels().get("items.1.name").map(String::as_str),
            Some("Item Name")
        );
    }
}
