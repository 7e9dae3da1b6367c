//! Validation rules, validators and validation groups.
//!
//! Formation does not own a rule engine. It routes declared rules to a
//! [`Validator`] created by a [`ValidatorFactory`], one per group of fields
//! sharing a dotted prefix, and reads failure messages back. The built-in
//! [`RuleValidator`] covers the common rules so the crate is usable on its
//! own.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, warn};

use crate::tree::{Scalar, ValueTree};

/// Name of the group holding single-segment fields.
pub const ROOT_GROUP: &str = "root";

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex is valid")
});

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^\s/?#]+[^\s]*$").expect("url regex is valid")
});

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("integer regex is valid"));

static TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01]?[0-9]|2[0-3]):[0-5][0-9](:[0-5][0-9])?$").expect("time regex is valid")
});

static DELIMITED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(?P<body>.*)/(?P<flags>[a-zA-Z]*)$").expect("delimiter regex is valid")
});

/// One declared rule, such as `required` or `max:255`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Rule name.
    pub name: String,
    /// Text after the first `:`.
    pub parameter: Option<String>,
}

impl Rule {
    /// Parses `name` or `name:parameter`.
    pub fn parse(text: &str) -> Self {
        match text.split_once(':') {
            Some((name, parameter)) => Self {
                name: name.trim().to_string(),
                parameter: Some(parameter.to_string()),
            },
            None => Self {
                name: text.trim().to_string(),
                parameter: None,
            },
        }
    }

    /// Returns the comma-separated parameters.
    pub fn parameters(&self) -> Vec<&str> {
        self.parameter
            .as_deref()
            .map(|p| p.split(',').map(str::trim).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parameter {
            Some(parameter) => write!(f, "{}:{parameter}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// The rules declared for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `|`-separated rule string. Everything after `regex:` belongs
    /// to the pattern, pipes included.
    pub fn parse(text: &str) -> Self {
        let mut rules = Vec::new();
        let mut rest = text;
        while !rest.is_empty() {
            if rest.starts_with("regex:") {
                rules.push(Rule::parse(rest));
                break;
            }
            let (head, tail) = rest.split_once('|').unwrap_or((rest, ""));
            if !head.trim().is_empty() {
                rules.push(Rule::parse(head));
            }
            rest = tail;
        }
        Self { rules }
    }

    /// Builds a rule set from individual rule strings.
    pub fn from_list<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rules: rules.into_iter().map(|r| Rule::parse(r.as_ref())).collect(),
        }
    }

    /// Returns whether a rule with this name is declared.
    pub fn has(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name == name)
    }

    /// Returns the first rule with this name.
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Iterates over the rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Returns whether no rule is declared.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl From<&str> for RuleSet {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<String> for RuleSet {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<Vec<&str>> for RuleSet {
    fn from(rules: Vec<&str>) -> Self {
        Self::from_list(rules)
    }
}

/// A validator for one group of fields.
pub trait Validator {
    /// Returns whether every field passes its rules.
    fn passes(&self) -> bool;

    /// Returns whether any field fails its rules.
    fn fails(&self) -> bool {
        !self.passes()
    }

    /// Returns the first failure message for a field key.
    fn first_message(&self, field: &str) -> Option<String>;
}

/// Creates validators for validation groups.
pub trait ValidatorFactory {
    /// Creates a validator over `data` (the whole input for the root group,
    /// the subtree at the group prefix otherwise).
    fn make(&self, data: &ValueTree, rules: &BTreeMap<String, RuleSet>) -> Box<dyn Validator>;
}

/// Factory for the built-in [`RuleValidator`].
#[derive(Debug, Clone, Default)]
pub struct RuleValidatorFactory {
    messages: BTreeMap<String, String>,
}

impl RuleValidatorFactory {
    /// Creates a factory using the default messages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory with custom messages, keyed `field.rule` or `rule`.
    pub fn with_messages<K, V>(messages: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            messages: messages
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ValidatorFactory for RuleValidatorFactory {
    fn make(&self, data: &ValueTree, rules: &BTreeMap<String, RuleSet>) -> Box<dyn Validator> {
        Box::new(RuleValidator::with_messages(data, rules, &self.messages))
    }
}

/// Built-in validator for the common rules.
///
/// Rules are evaluated once, on construction. Every rule but `required`
/// skips empty values. Unknown rules are ignored.
#[derive(Debug, Clone, Default)]
pub struct RuleValidator {
    failures: BTreeMap<String, String>,
}

impl RuleValidator {
    /// Validates `data` against `rules` with the default messages.
    pub fn new(data: &ValueTree, rules: &BTreeMap<String, RuleSet>) -> Self {
        Self::with_messages(data, rules, &BTreeMap::new())
    }

    /// Validates `data` against `rules`, preferring custom messages keyed
    /// `field.rule` or `rule`.
    pub fn with_messages(
        data: &ValueTree,
        rules: &BTreeMap<String, RuleSet>,
        messages: &BTreeMap<String, String>,
    ) -> Self {
        let mut failures = BTreeMap::new();
        for (field, rule_set) in rules {
            let value = data.get_dotted(field);
            let failed = rule_set
                .iter()
                .find(|rule| !check_rule(rule, rule_set, value));
            if let Some(rule) = failed {
                let template = messages
                    .get(&format!("{field}.{}", rule.name))
                    .or_else(|| messages.get(&rule.name))
                    .cloned()
                    .unwrap_or_else(|| default_message(rule, rule_set));
                failures.insert(field.clone(), fill_message(&template, field, rule));
            }
        }
        Self { failures }
    }

    /// Returns every failure message keyed by field.
    pub fn failures(&self) -> &BTreeMap<String, String> {
        &self.failures
    }
}

impl Validator for RuleValidator {
    fn passes(&self) -> bool {
        self.failures.is_empty()
    }

    fn first_message(&self, field: &str) -> Option<String> {
        self.failures.get(field).cloned()
    }
}

fn is_numeric_context(rules: &RuleSet) -> bool {
    rules.has("numeric") || rules.has("integer")
}

fn check_rule(rule: &Rule, rules: &RuleSet, value: Option<&ValueTree>) -> bool {
    let present = value.is_some_and(|v| match v {
        ValueTree::Scalar(s) => !s.as_text().trim().is_empty() || matches!(s, Scalar::Bool(_)),
        _ => !v.is_empty(),
    });
    if rule.name == "required" {
        return present;
    }
    if !present {
        return true;
    }
    let text = value.map(ValueTree::as_text).unwrap_or_default();

    match rule.name.as_str() {
        "email" => EMAIL.is_match(&text),
        "url" => URL.is_match(&text),
        "integer" => INTEGER.is_match(text.trim()),
        "numeric" => text.trim().parse::<f64>().is_ok(),
        "date" => parse_date(&text).is_some(),
        "time" => TIME.is_match(text.trim()),
        "alpha" => text.chars().all(char::is_alphabetic),
        "alpha_num" => text.chars().all(char::is_alphanumeric),
        "alpha_dash" => text
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_'),
        "boolean" => matches!(text.as_str(), "1" | "0" | "" | "true" | "false"),
        "in" => rule.parameters().contains(&text.as_str()),
        "min" | "max" => check_size(rule, rules, value, &text),
        "regex" => check_pattern(rule, &text),
        other => {
            debug!(rule = other, "ignoring unsupported validation rule");
            true
        }
    }
}

fn check_size(rule: &Rule, rules: &RuleSet, value: Option<&ValueTree>, text: &str) -> bool {
    let Some(limit) = rule
        .parameter
        .as_deref()
        .and_then(|p| p.trim().parse::<f64>().ok())
    else {
        warn!(rule = %rule, "size rule without a numeric parameter");
        return true;
    };

    let size = match value {
        Some(ValueTree::Seq(items)) => items.len() as f64,
        Some(ValueTree::Map(items)) => items.len() as f64,
        _ if is_numeric_context(rules) => match text.trim().parse::<f64>() {
            Ok(n) => n,
            Err(_) => return true,
        },
        _ => text.chars().count() as f64,
    };

    if rule.name == "min" {
        size >= limit
    } else {
        size <= limit
    }
}

fn check_pattern(rule: &Rule, text: &str) -> bool {
    let Some(pattern) = rule.parameter.as_deref() else {
        return true;
    };
    match compile_pattern(pattern) {
        Ok(regex) => regex.is_match(text),
        Err(error) => {
            warn!(pattern, %error, "ignoring invalid regex rule");
            true
        }
    }
}

/// Compiles a rule pattern, accepting the `/body/flags` delimited form.
pub fn compile_pattern(pattern: &str) -> crate::Result<Regex> {
    let source = match DELIMITED.captures(pattern) {
        Some(captures) => {
            let body = &captures["body"];
            let flags: String = captures["flags"]
                .chars()
                .filter(|c| matches!(c, 'i' | 'm' | 's' | 'x' | 'U'))
                .collect();
            if flags.is_empty() {
                body.to_string()
            } else {
                format!("(?{flags}){body}")
            }
        }
        None => pattern.to_string(),
    };
    Regex::new(&source).map_err(|source| crate::FormationError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let date_part = text.split([' ', 'T']).next().unwrap_or(text);
    ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

fn default_message(rule: &Rule, rules: &RuleSet) -> String {
    let numeric = is_numeric_context(rules);
    match rule.name.as_str() {
        "required" => "The :attribute field is required.".to_string(),
        "email" => "The :attribute must be a valid email address.".to_string(),
        "integer" => "The :attribute must be an integer.".to_string(),
        "numeric" => "The :attribute must be a number.".to_string(),
        "date" => "The :attribute is not a valid date.".to_string(),
        "time" => "The :attribute is not a valid time.".to_string(),
        "min" if numeric => "The :attribute must be at least :value.".to_string(),
        "min" => "The :attribute must be at least :value characters.".to_string(),
        "max" if numeric => "The :attribute may not be greater than :value.".to_string(),
        "max" => "The :attribute may not be greater than :value characters.".to_string(),
        "in" => "The selected :attribute is invalid.".to_string(),
        "alpha" => "The :attribute may only contain letters.".to_string(),
        "alpha_num" => "The :attribute may only contain letters and numbers.".to_string(),
        "alpha_dash" => "The :attribute may only contain letters, numbers and dashes.".to_string(),
        "boolean" => "The :attribute field must be true or false.".to_string(),
        _ => "The :attribute format is invalid.".to_string(),
    }
}

fn fill_message(template: &str, field: &str, rule: &Rule) -> String {
    template
        .replace(":attribute", &field.replace('_', " "))
        .replace(":value", rule.parameter.as_deref().unwrap_or_default())
}

/// Lifecycle of a validation group.
enum GroupState {
    Unbound,
    Bound(Box<dyn Validator>),
    Evaluated {
        validator: Box<dyn Validator>,
        passed: bool,
    },
}

/// A bucket of `field → rules` pairs validated together.
///
/// The validator is created on first use and evaluated at most once.
pub struct ValidationGroup {
    rules: BTreeMap<String, RuleSet>,
    state: GroupState,
}

impl Default for ValidationGroup {
    fn default() -> Self {
        Self {
            rules: BTreeMap::new(),
            state: GroupState::Unbound,
        }
    }
}

impl fmt::Debug for ValidationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            GroupState::Unbound => "unbound".to_string(),
            GroupState::Bound(_) => "bound".to_string(),
            GroupState::Evaluated { passed, .. } => format!("evaluated({passed})"),
        };
        f.debug_struct("ValidationGroup")
            .field("rules", &self.rules)
            .field("state", &state)
            .finish()
    }
}

impl ValidationGroup {
    /// Creates an empty, unbound group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares rules for a field key. Any bound validator is discarded.
    pub fn add_rules(&mut self, field: impl Into<String>, rules: RuleSet) {
        self.rules.insert(field.into(), rules);
        self.state = GroupState::Unbound;
    }

    /// Returns the declared rules.
    pub fn rules(&self) -> &BTreeMap<String, RuleSet> {
        &self.rules
    }

    /// Returns whether a validator has been created.
    pub fn is_bound(&self) -> bool {
        !matches!(self.state, GroupState::Unbound)
    }

    /// Returns the cached outcome, if evaluated.
    pub fn outcome(&self) -> Option<bool> {
        match self.state {
            GroupState::Evaluated { passed, .. } => Some(passed),
            _ => None,
        }
    }

    /// Creates the validator if the group is unbound.
    pub fn bind(&mut self, data: &ValueTree, factory: &dyn ValidatorFactory) {
        if matches!(self.state, GroupState::Unbound) {
            debug!(fields = self.rules.len(), "binding validation group");
            self.state = GroupState::Bound(factory.make(data, &self.rules));
        }
    }

    /// Binds and evaluates the group once, returning the cached outcome
    /// afterwards.
    pub fn passes(&mut self, data: &ValueTree, factory: &dyn ValidatorFactory) -> bool {
        self.bind(data, factory);
        let state = std::mem::replace(&mut self.state, GroupState::Unbound);
        let (state, passed) = match state {
            GroupState::Bound(validator) => {
                let passed = validator.passes();
                (GroupState::Evaluated { validator, passed }, passed)
            }
            GroupState::Evaluated { validator, passed } => {
                (GroupState::Evaluated { validator, passed }, passed)
            }
            GroupState::Unbound => (GroupState::Unbound, true),
        };
        self.state = state;
        passed
    }

    /// Returns the first failure message for a field key, evaluating the
    /// group if needed.
    pub fn first_message(
        &mut self,
        field: &str,
        data: &ValueTree,
        factory: &dyn ValidatorFactory,
    ) -> Option<String> {
        self.passes(data, factory);
        match &self.state {
            GroupState::Evaluated { validator, .. } | GroupState::Bound(validator) => {
                validator.first_message(field).filter(|m| !m.is_empty())
            }
            GroupState::Unbound => None,
        }
    }

    /// Drops the validator and its cached outcome.
    pub fn reset(&mut self) {
        self.state = GroupState::Unbound;
    }
}

/// Splits a dotted field name into its group key and local key.
pub fn group_key(name: &str) -> (String, String) {
    match name.rsplit_once('.') {
        Some((group, last)) => (group.to_string(), last.to_string()),
        None => (ROOT_GROUP.to_string(), name.to_string()),
    }
}
