//! Validation groups, error message lookup and error decoration.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use ironhtml::html;
use ironhtml::typed::Element;
use ironhtml_elements::{Li, Ul};
use tracing::debug;

use crate::context::Formation;
use crate::error::ErrorMap;
use crate::path::strip_suppression;
use crate::render::attrs::{escape, has_markup, Attributes};
use crate::render::field::FieldKind;
use crate::text::{icon_markup, title_case};
use crate::tree::ValueTree;
use crate::validation::{group_key, RuleSet, ValidationGroup, ROOT_GROUP};

/// Replacement names that change the case of the label instead of replacing it.
const CASE_TOKENS: [&str; 3] = ["LOWERCASE", "UPPERCASE", "UPPERCASE-WORDS"];

fn apply_case_token(name: &str, token: Option<&str>) -> String {
    match token {
        Some("LOWERCASE") => name.to_lowercase(),
        Some("UPPERCASE") => name.to_uppercase(),
        Some("UPPERCASE-WORDS") => title_case(&name.to_lowercase()),
        _ => name.to_string(),
    }
}

/// The data a group validates: the whole input for the root group, the
/// subtree at the group key otherwise.
fn group_data<'a>(input: &'a ValueTree, group: &str) -> Cow<'a, ValueTree> {
    if group == ROOT_GROUP {
        return Cow::Borrowed(input);
    }
    match input.get_dotted(group) {
        Some(tree) => Cow::Borrowed(tree),
        None => Cow::Owned(ValueTree::new()),
    }
}

impl Formation {
    /// Declares validation rules, optionally under a dotted `prefix`.
    ///
    /// Fields are bucketed by their parent path: single-segment names go to
    /// the `root` group, `items.1.name` goes to the `items.1` group.
    pub fn set_validation_rules<K, R>(
        &mut self,
        rules: impl IntoIterator<Item = (K, R)>,
        prefix: Option<&str>,
    ) -> &BTreeMap<String, ValidationGroup>
    where
        K: AsRef<str>,
        R: Into<RuleSet>,
    {
        for (name, rule_set) in rules {
            let name = match prefix {
                Some(p) if !p.is_empty() => {
                    format!("{}.{}", p.trim_end_matches('.'), name.as_ref())
                }
                _ => name.as_ref().to_string(),
            };
            let name = strip_suppression(&name);
            let rule_set = rule_set.into();

            if !self.validation_fields.contains(&name) {
                self.validation_fields.push(name.clone());
            }
            let (group, last) = group_key(&name);
            self.groups
                .entry(group)
                .or_default()
                .add_rules(last, rule_set.clone());
            self.rules.insert(name, rule_set);
        }
        &self.groups
    }

    /// Returns whether validation passes.
    ///
    /// `None` checks every group, a name ending in `.` checks every group
    /// whose key starts with it, and any other name checks exactly that
    /// group (a missing group fails).
    pub fn validated(&mut self, index: Option<&str>) -> bool {
        let input = &self.request.input;
        let factory = self.factory.as_ref();

        match index {
            None => self
                .groups
                .iter_mut()
                .all(|(key, group)| group.passes(&group_data(input, key), factory)),
            Some(prefix) if prefix.ends_with('.') => self
                .groups
                .iter_mut()
                .filter(|(key, _)| key.starts_with(prefix))
                .all(|(key, group)| group.passes(&group_data(input, key), factory)),
            Some(name) => match self.groups.get_mut(name) {
                Some(group) => group.passes(&group_data(input, name), factory),
                None => {
                    debug!(group = name, "no validation group with this name");
                    false
                }
            },
        }
    }

    /// The name a message uses for a field: the registered or derived label
    /// without a trailing colon.
    fn default_display_name(&self, name: &str) -> String {
        let label = self.name_to_label(name);
        label.strip_suffix(':').unwrap_or(&label).to_string()
    }

    fn display_name(&self, name: &str, replacement: Option<&str>) -> String {
        let display = match replacement {
            Some(r) if !r.is_empty() && !CASE_TOKENS.contains(&r) => r.to_string(),
            token => apply_case_token(&self.default_display_name(name), token),
        };
        if has_markup(&display) {
            display
        } else {
            escape(&display)
        }
    }

    /// Returns the error message for a field, if it has one.
    ///
    /// A message cached this session wins. Otherwise, on submissions, the
    /// field's validation group is evaluated and its first message for the
    /// local name is cached. The field name inside the message is replaced
    /// by its label, by `replacement`, or by the label in the case asked for
    /// with `LOWERCASE`, `UPPERCASE` or `UPPERCASE-WORDS`. The configured
    /// icon is prepended unless `ignore_icon` is set or the message already
    /// carries one.
    pub fn error_message(
        &mut self,
        name: &str,
        replacement: Option<&str>,
        ignore_icon: bool,
    ) -> Option<String> {
        let name = strip_suppression(name.trim_end_matches('.'));
        if name.is_empty() {
            return None;
        }
        let default_display = self.default_display_name(&name);

        if !self.errors.contains(&name) && self.is_submission() {
            let (group_name, last) = group_key(&name);
            let input = &self.request.input;
            let factory = self.factory.as_ref();
            let found = self.groups.get_mut(&group_name).and_then(|group| {
                group.first_message(&last, &group_data(input, &group_name), factory)
            });
            if let Some(message) = found {
                let message = message.replacen(&last.replace('_', " "), &default_display, 1);
                self.errors.insert(name.clone(), message);
            }
        }

        let cached = self.errors.get(&name)?;
        let display = self.display_name(&name, replacement);
        let mut message = if default_display.is_empty() {
            cached.to_string()
        } else {
            cached.replacen(&default_display, &display, 1)
        };

        if !ignore_icon && !message.contains("glyphicon") {
            if let Some(icon) = self.config.error.icon.as_deref().filter(|i| !i.is_empty()) {
                message = format!("{}{message}", icon_markup(icon));
            }
        }
        Some(message)
    }

    /// Returns the configured error class.
    pub fn error_class(&self) -> &str {
        &self.config.error.class
    }

    /// Adds the error class to `attributes` when the field has an error.
    pub fn add_error_class(&mut self, name: &str, mut attributes: Attributes) -> Attributes {
        if self.error_message(name, None, true).is_some() {
            let class = self.config.error.class.clone();
            attributes.add_class(&class);
        }
        attributes
    }

    /// Returns every error message, looking up messages for every field
    /// with declared rules first.
    pub fn errors(&mut self) -> &ErrorMap {
        let fields = self.validation_fields.clone();
        for field in fields {
            self.error_message(&field, None, true);
        }
        &self.errors
    }

    /// Returns the error message of one field, computed like
    /// [`Formation::errors`].
    pub fn error(&mut self, key: &str) -> Option<&str> {
        let key = strip_suppression(key);
        self.errors().get(&key)
    }

    /// Loads the errors persisted by the previous request into the error map.
    pub fn load_session_errors(&mut self) -> &ErrorMap {
        let messages = self
            .request
            .errors
            .as_ref()
            .map(|errors| errors.first_messages())
            .unwrap_or_default();
        for (field, message) in messages {
            self.errors.insert(field, message);
        }
        &self.errors
    }

    /// Forgets every error message, persisted ones included.
    pub fn reset_errors(&mut self) {
        self.request.errors = None;
        self.errors.clear();
    }

    /// Replaces the default-error table, keyed `name.kind`, `name.required`,
    /// `name`, `kind.required`, `kind` or `required`.
    pub fn set_default_errors<K, V>(&mut self, messages: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.default_errors = messages
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
    }

    /// Looks up the default error of a field in the default-error table.
    pub fn default_error(&self, name: &str, kind: FieldKind) -> Option<String> {
        if self.default_errors.is_empty() {
            return None;
        }
        let name = strip_suppression(name);
        let required = self.rules_for(&name).is_some_and(|r| r.has("required"));
        let kind = kind.as_str().replace("-set", "");

        let mut search = vec![format!("{name}.{kind}")];
        if required {
            search.push(format!("{name}.required"));
        }
        search.push(name.clone());
        if required {
            search.push(format!("{kind}.required"));
        }
        search.push(kind);
        if required {
            search.push("required".to_string());
        }

        search
            .iter()
            .find_map(|key| self.default_errors.get(key))
            .cloned()
    }

    /// Renders the inline error element of a field.
    ///
    /// When container errors are shown and tooltips are off, a live error
    /// message is rendered visibly. Otherwise the element carries `message`
    /// or the default error and stays hidden until the browser script
    /// reveals it.
    pub fn error_tag(&mut self, name: &str, kind: FieldKind, message: Option<&str>) -> String {
        let config = Arc::clone(&self.config);
        let name = name.trim_end_matches('.');
        let id = self.field_id(name, &Attributes::new());

        if config.field_container.error && !config.error.type_label_tooltip {
            if let Some(live) = self.error_message(name, None, false) {
                return self.error_element(id, &live, true) + "\n";
            }
        }

        let message = message
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .or_else(|| self.default_error(name, kind))
            .unwrap_or_default();
        self.error_element(id, &message, false) + "\n"
    }

    fn error_element(&self, id: Option<String>, message: &str, visible: bool) -> String {
        let element = &self.config.error.element;
        let mut attributes = Attributes::new().with("class", &self.config.error.element_class);
        if let Some(id) = id {
            attributes.set("id", format!("{id}-error"));
        }
        if !visible {
            attributes.set("style", "display: none;");
        }
        format!("<{element}{}>{message}</{element}>", attributes.to_html())
    }

    /// Renders every error message as an alert list, or nothing when there
    /// are no errors.
    pub fn error_summary(&mut self) -> String {
        let fields: Vec<String> = self.errors().iter().map(|(f, _)| f.to_string()).collect();
        let messages: Vec<String> = fields
            .iter()
            .filter_map(|field| self.error_message(field, None, false))
            .collect();
        if messages.is_empty() {
            return String::new();
        }

        html! { div.class("alert alert-danger") }
            .attr("role", "alert")
            .child::<Ul, _>(|ul| {
                ul.class("mb-0")
                    .children(messages.iter(), |m, li: Element<Li>| li.raw(m))
            })
            .render()
    }
}
