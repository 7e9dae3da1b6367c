//! Default values, bound values and reading submitted values back.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::context::Formation;
use crate::path::{strip_suppression, FieldPath};
use crate::text::camel_to_snake;
use crate::tree::{Scalar, ValueTree};
use crate::validation::RuleSet;

/// Suffix of model attributes holding a display-formatted copy of a value.
pub const FORMATTED_SUFFIX: &str = "_formatted";

static TIME_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<hour>[0-9]{1,2}):(?P<minutes>[0-9]{2})(?::[0-9]{2})?$")
        .expect("time value regex is valid")
});

/// Items of a related collection, used to seed nested defaults.
///
/// Each item is a `field → value` map; a `pivot` entry holding a mapping
/// carries the join-table fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationDefaults {
    /// Relation name; camel case is converted to snake case for field names.
    pub name: String,
    /// When set, only this field is collected into a list at the relation name.
    pub field: Option<String>,
    /// Related items.
    pub items: Vec<BTreeMap<String, ValueTree>>,
}

impl RelationDefaults {
    /// Creates an empty relation.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Collects a single field of every item into a list.
    #[must_use]
    pub fn single_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Adds an item.
    #[must_use]
    pub fn item<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ValueTree>,
    {
        self.items.push(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }
}

/// How [`Formation::add_values`] reads a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSpec {
    /// Trimmed text.
    Text,
    /// Trimmed text, or nothing when `false`.
    Include(bool),
    /// Trimmed text, only when it is one of the allowed values.
    OneOf(Vec<String>),
    /// Checkbox state as a boolean.
    Checkbox,
}

/// Label, rules and default for one field, see [`Formation::setup`].
#[derive(Debug, Clone, Default)]
pub struct FieldSetup {
    /// Label.
    pub label: Option<String>,
    /// Validation rules.
    pub rules: Option<RuleSet>,
    /// Default value.
    pub default: Option<ValueTree>,
}

impl FieldSetup {
    /// Creates an empty setup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the rules.
    #[must_use]
    pub fn rules(mut self, rules: impl Into<RuleSet>) -> Self {
        self.rules = Some(rules.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<ValueTree>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Splits `HH:MM[:SS]` into an unpadded 12-hour hour, the minutes and the
/// meridiem.
pub fn split_time(value: &str) -> Option<(String, String, String)> {
    let caps = TIME_VALUE.captures(value.trim())?;
    let hour: u32 = caps["hour"].parse().ok()?;
    let meridiem = if hour >= 12 { "pm" } else { "am" };
    let hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    Some((
        hour.to_string(),
        caps["minutes"].to_string(),
        meridiem.to_string(),
    ))
}

/// Reassembles a 24-hour `HH:MM:00` time from select-time parts.
pub fn join_time(hour: &str, minutes: &str, meridiem: &str) -> String {
    let mut hour: u32 = hour.trim().parse().unwrap_or(0);
    let minutes: u32 = minutes.trim().parse().unwrap_or(0);
    if hour == 12 {
        hour = 0;
    }
    if meridiem.trim().eq_ignore_ascii_case("pm") {
        hour += 12;
    }
    format!("{hour:02}:{minutes:02}:00")
}

fn collapse_formatted(field: &str) -> &str {
    field.strip_suffix(FORMATTED_SUFFIX).unwrap_or(field)
}

impl Formation {
    /// Adds default values, optionally under `prefix`, plus nested defaults
    /// for related items.
    ///
    /// A default that looks like a time (`HH:MM[:SS]`) also seeds the
    /// `_hour`, `_minutes` and `_meridiem` fields of a select-time triplet.
    pub fn set_defaults<K, V>(
        &mut self,
        defaults: impl IntoIterator<Item = (K, V)>,
        relations: &[RelationDefaults],
        prefix: Option<&str>,
    ) -> &BTreeMap<String, ValueTree>
    where
        K: AsRef<str>,
        V: Into<ValueTree>,
    {
        let prefix = match prefix {
            Some(p) if !p.is_empty() => format!("{}.", p.trim_end_matches('.')),
            _ => String::new(),
        };

        for (field, value) in defaults {
            let field = strip_suppression(field.as_ref());
            let value = value.into();
            if let Some((hour, minutes, meridiem)) =
                value.as_scalar().and_then(|s| split_time(&s.as_text()))
            {
                self.defaults
                    .insert(format!("{prefix}{field}_hour"), hour.into());
                self.defaults
                    .insert(format!("{prefix}{field}_minutes"), minutes.into());
                self.defaults
                    .insert(format!("{prefix}{field}_meridiem"), meridiem.into());
            }
            self.defaults.insert(format!("{prefix}{field}"), value);
        }

        for relation in relations {
            self.merge_relation(relation, &prefix);
        }

        &self.defaults
    }

    fn merge_relation(&mut self, relation: &RelationDefaults, prefix: &str) {
        if relation.items.is_empty() {
            debug!(relation = %relation.name, "relation has no items for defaults");
            return;
        }
        let item_prefix = format!("{prefix}{}", camel_to_snake(&relation.name));

        if let Some(field) = &relation.field {
            let mut values = Vec::new();
            let mut pivot_values = Vec::new();
            for item in &relation.items {
                if let Some(value) = item.get(field) {
                    values.push(value.clone());
                }
                if let Some(ValueTree::Map(pivot)) = item.get("pivot") {
                    if let Some(value) = pivot.get(field) {
                        pivot_values.push(value.clone());
                    }
                }
            }
            if !values.is_empty() {
                self.defaults.insert(item_prefix.clone(), values.into());
            }
            if !pivot_values.is_empty() {
                self.defaults
                    .insert(format!("{item_prefix}.pivot"), pivot_values.into());
            }
            return;
        }

        for (index, item) in relation.items.iter().enumerate() {
            let number = index + 1;
            for (field, value) in item {
                match (field.as_str(), value) {
                    ("pivot", ValueTree::Map(pivot)) => {
                        for (pivot_field, pivot_value) in pivot {
                            self.defaults.insert(
                                format!(
                                    "{item_prefix}.{number}.pivot.{}",
                                    collapse_formatted(pivot_field)
                                ),
                                pivot_value.clone(),
                            );
                        }
                    }
                    _ => {
                        self.defaults.insert(
                            format!("{item_prefix}.{number}.{}", collapse_formatted(field)),
                            value.clone(),
                        );
                    }
                }
            }
        }
    }

    /// Returns the flat defaults, keyed by dotted name.
    pub fn defaults(&self) -> &BTreeMap<String, ValueTree> {
        &self.defaults
    }

    /// Adds defaults and makes defaults win over submitted and flashed input
    /// from now on.
    pub fn reset_defaults<K, V>(&mut self, defaults: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<ValueTree>,
    {
        self.set_defaults(defaults, &[], None);
        self.reset = true;
    }

    /// Returns the flashed input when there is some, the submitted input
    /// otherwise.
    pub fn post(&self) -> &ValueTree {
        if self.request.old.is_empty() {
            &self.request.input
        } else {
            &self.request.old
        }
    }

    /// Returns the bound value of a field: flashed input, then submitted
    /// input, then the default. Missing values are empty text.
    pub fn value(&self, name: &str) -> ValueTree {
        let key = strip_suppression(name);
        let mut value = self
            .defaults
            .get(&key)
            .cloned()
            .or_else(|| self.defaults_tree(None).get_dotted(&key).cloned());

        if !self.reset {
            if self.request.is_submission() {
                value = self.request.input.get_dotted(&key).cloned();
            }
            if let Some(old) = self.request.old.get_dotted(&key) {
                value = Some(old.clone());
            }
        }

        value.unwrap_or_else(|| ValueTree::Scalar(Scalar::Text(String::new())))
    }

    /// Returns the bound value of a field as text.
    pub fn value_text(&self, name: &str) -> String {
        self.value(name).as_text()
    }

    /// Returns whether a checkbox field is on.
    pub fn checked(&self, name: &str) -> bool {
        match self.value(name) {
            ValueTree::Scalar(s) => s.is_truthy(),
            tree => !tree.is_empty(),
        }
    }

    /// Returns the values of the form or of a nested part of it.
    ///
    /// Submitted input wins, then flashed input, then defaults.
    pub fn values(&self, name: Option<&str>) -> ValueTree {
        let key = name.map(strip_suppression);
        let pick = |tree: &ValueTree| match &key {
            Some(key) => tree.get_dotted(key).cloned(),
            None => Some(tree.clone()),
        };

        if !self.reset {
            if self.request.is_submission() {
                return pick(&self.request.input).unwrap_or_default();
            }
            if let Some(old) = pick(&self.request.old).filter(|t| !t.is_empty()) {
                return old;
            }
        }
        self.defaults_tree(key.as_deref())
    }

    /// Returns the values as a tree: submitted or flashed input when
    /// present, defaults otherwise.
    pub fn values_tree(&self, name: Option<&str>) -> ValueTree {
        if !self.reset && !self.post().is_empty() {
            let post = self.post();
            return match name {
                Some(name) => post
                    .get_dotted(&strip_suppression(name))
                    .cloned()
                    .unwrap_or_default(),
                None => post.clone(),
            };
        }
        self.defaults_tree(name)
    }

    /// Returns the defaults unflattened into a tree.
    pub fn defaults_tree(&self, name: Option<&str>) -> ValueTree {
        let mut tree = ValueTree::new();
        for (key, value) in &self.defaults {
            let path = FieldPath::parse(key);
            if path.len() > crate::tree::MAX_DEPTH {
                continue;
            }
            tree.set_tree(&path, value);
        }
        match name {
            Some(name) => tree
                .get_dotted(&strip_suppression(name))
                .cloned()
                .unwrap_or_default(),
            None => tree,
        }
    }

    /// Returns [`Formation::values_tree`] as a JSON string.
    pub fn values_json(&self, name: Option<&str>) -> String {
        self.values_tree(name).to_json().to_string()
    }

    /// Reads a dotted field from a tree, or `""` when it is missing or not a
    /// scalar.
    pub fn value_from_tree(field: &str, tree: &ValueTree) -> String {
        tree.get_dotted(field)
            .map(ValueTree::as_text)
            .unwrap_or_default()
    }

    /// Reassembles the 24-hour time of a select-time triplet named `name`.
    pub fn value_time(&self, name: &str) -> String {
        let prefix = if name.ends_with('_') {
            name.to_string()
        } else {
            format!("{name}_")
        };
        join_time(
            &self.value_text(&format!("{prefix}hour")),
            &self.value_text(&format!("{prefix}minutes")),
            &self.value_text(&format!("{prefix}meridiem")),
        )
    }

    /// Copies bound values of the given fields into `data`.
    pub fn add_values<'a>(
        &self,
        data: &mut BTreeMap<String, Scalar>,
        fields: impl IntoIterator<Item = (&'a str, ValueSpec)>,
    ) {
        for (field, spec) in fields {
            let value = match spec {
                ValueSpec::Text | ValueSpec::Include(true) => {
                    Scalar::Text(self.value_text(field).trim().to_string())
                }
                ValueSpec::Include(false) => continue,
                ValueSpec::OneOf(allowed) => {
                    let text = self.value_text(field).trim().to_string();
                    if !allowed.contains(&text) {
                        continue;
                    }
                    Scalar::Text(text)
                }
                ValueSpec::Checkbox => Scalar::Bool(self.checked(field)),
            };
            data.insert(field.to_string(), value);
        }
    }

    /// Copies the trimmed text of the given fields into `data`.
    pub fn add_text_values<'a>(
        &self,
        data: &mut BTreeMap<String, Scalar>,
        fields: impl IntoIterator<Item = &'a str>,
    ) {
        self.add_values(data, fields.into_iter().map(|f| (f, ValueSpec::Text)));
    }

    /// Copies checkbox states of the given fields into `data`.
    pub fn add_checkbox_values<'a>(
        &self,
        data: &mut BTreeMap<String, Scalar>,
        checkboxes: impl IntoIterator<Item = &'a str>,
    ) {
        self.add_values(data, checkboxes.into_iter().map(|f| (f, ValueSpec::Checkbox)));
    }

    /// Sets up labels, rules and defaults for a whole form at once.
    pub fn setup<K>(&mut self, form: impl IntoIterator<Item = (K, FieldSetup)>)
    where
        K: Into<String>,
    {
        let mut labels = Vec::new();
        let mut rules = Vec::new();
        let mut defaults = Vec::new();

        for (name, field) in form {
            let name: String = name.into();
            if let Some(label) = field.label.filter(|l| !l.is_empty()) {
                labels.push((name.clone(), label));
            }
            if let Some(rule_set) = field.rules.filter(|r| !r.is_empty()) {
                rules.push((name.clone(), rule_set));
            }
            if let Some(default) = field.default {
                defaults.push((name, default));
            }
        }

        self.set_labels(labels);
        self.set_validation_rules(rules, None);
        self.set_defaults(defaults, &[], None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormationConfig;
    use crate::context::RequestData;
    use crate::tree::unflatten;

    fn formation(request: RequestData) -> Formation {
        Formation::new(FormationConfig::default(), request)
    }

    #[test]
    fn test_split_time() {
        assert_eq!(
            split_time("14:30:00"),
            Some(("2".into(), "30".into(), "pm".into()))
        );
        assert_eq!(
            split_time("00:05"),
            Some(("12".into(), "05".into(), "am".into()))
        );
        assert_eq!(
            split_time("12:00"),
            Some(("12".into(), "00".into(), "pm".into()))
        );
        assert_eq!(split_time("soon"), None);
    }

    #[test]
    fn test_join_time() {
        assert_eq!(join_time("2", "30", "pm"), "14:30:00");
        assert_eq!(join_time("12", "15", "am"), "00:15:00");
        assert_eq!(join_time("12", "00", "pm"), "12:00:00");
    }

    #[test]
    fn test_defaults_with_time_split() {
        let mut f = formation(RequestData::new());
        f.set_defaults([("start_time", "14:30:00")], &[], None);
        assert_eq!(f.value_text("start_time_hour"), "2");
        assert_eq!(f.value_text("start_time_minutes"), "30");
        assert_eq!(f.value_text("start_time_meridiem"), "pm");
        assert_eq!(f.value_time("start_time"), "14:30:00");
    }

    #[test]
    fn test_prefixed_defaults() {
        let mut f = formation(RequestData::new());
        f.set_defaults([("name", "Ann")], &[], Some("user"));
        assert_eq!(f.value_text("user.name"), "Ann");
        assert_eq!(
            f.defaults_tree(Some("user")).get_dotted("name").unwrap().as_text(),
            "Ann"
        );
    }

    #[test]
    fn test_submitted_input_wins() {
        let request = RequestData::new().with_form_pairs([("name", "Posted")]);
        let mut f = formation(request);
        f.set_defaults([("name", "Default"), ("other", "kept")], &[], None);
        assert_eq!(f.value_text("name"), "Posted");
        // A submission without the field binds nothing.
        assert_eq!(f.value_text("other"), "");

        f.reset_defaults(Vec::<(&str, &str)>::new());
        assert_eq!(f.value_text("name"), "Default");
    }

    #[test]
    fn test_old_input_wins() {
        let request = RequestData::new().with_old(unflatten([("name", "Flashed")]));
        let mut f = formation(request);
        f.set_defaults([("name", "Default")], &[], None);
        assert_eq!(f.value_text("name"), "Flashed");
        assert_eq!(f.post().get_dotted("name").unwrap().as_text(), "Flashed");
    }

    #[test]
    fn test_relation_defaults() {
        let mut f = formation(RequestData::new());
        let relation = RelationDefaults::new("userRoles")
            .item([
                ("name", ValueTree::from("admin")),
                ("since", ValueTree::from("2020-01-01")),
                ("since_formatted", ValueTree::from("01/01/2020")),
                (
                    "pivot",
                    ValueTree::Map(BTreeMap::from([("level".to_string(), ValueTree::from("3"))])),
                ),
            ])
            .item([("name", "editor")]);
        f.set_defaults(Vec::<(&str, &str)>::new(), &[relation], None);

        assert_eq!(f.value_text("user_roles.1.name"), "admin");
        assert_eq!(f.value_text("user_roles.1.since"), "01/01/2020");
        assert_eq!(f.value_text("user_roles.1.pivot.level"), "3");
        assert_eq!(f.value_text("user_roles.2.name"), "editor");
    }

    #[test]
    fn test_single_field_relation() {
        let mut f = formation(RequestData::new());
        let relation = RelationDefaults::new("roles")
            .single_field("id")
            .item([("id", "1")])
            .item([("id", "4")]);
        f.set_defaults(Vec::<(&str, &str)>::new(), &[relation], None);

        let roles = f.value("roles");
        let values: Vec<String> = roles.scalar_values().iter().map(|s| s.as_text()).collect();
        assert_eq!(values, vec!["1", "4"]);
    }

    #[test]
    fn test_checked() {
        let request = RequestData::new().with_form_pairs([("newsletter", "1"), ("terms", "0")]);
        let f = formation(request);
        assert!(f.checked("newsletter"));
        assert!(!f.checked("terms"));
        assert!(!f.checked("missing"));
    }

    #[test]
    fn test_add_values() {
        let request = RequestData::new().with_form_pairs([
            ("name", "  Ann  "),
            ("role", "admin"),
            ("color", "purple"),
            ("agree", "1"),
        ]);
        let f = formation(request);
        let mut data = BTreeMap::new();
        f.add_values(
            &mut data,
            [
                ("name", ValueSpec::Text),
                ("role", ValueSpec::Include(false)),
                ("color", ValueSpec::OneOf(vec!["red".into(), "blue".into()])),
                ("agree", ValueSpec::Checkbox),
            ],
        );
        assert_eq!(data.get("name"), Some(&Scalar::from("Ann")));
        assert!(!data.contains_key("role"));
        assert!(!data.contains_key("color"));
        assert_eq!(data.get("agree"), Some(&Scalar::Bool(true)));
    }

    #[test]
    fn test_setup() {
        let mut f = formation(RequestData::new());
        f.setup([
            (
                "email",
                FieldSetup::new()
                    .label("E-mail")
                    .rules("required|email")
                    .default_value("a@b.co"),
            ),
            ("name", FieldSetup::new().label("")),
        ]);
        assert_eq!(f.labels().get("email").map(String::as_str), Some("E-mail"));
        assert!(!f.labels().contains_key("name"));
        assert!(f.rules_for("email").unwrap().has("required"));
        assert_eq!(f.value_text("email"), "a@b.co");
    }

    #[test]
    fn test_values_json() {
        let mut f = formation(RequestData::new());
        f.set_defaults([("user.name", "Ann"), ("user.tags.0", "x")], &[], None);
        assert_eq!(
            f.values_json(Some("user")),
            r#"{"name":"Ann","tags":["x"]}"#
        );
        assert_eq!(
            Formation::value_from_tree("user.name", &f.values_tree(None)),
            "Ann"
        );
    }
}
