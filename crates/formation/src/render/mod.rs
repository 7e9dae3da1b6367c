//! HTML rendering of labels, fields, containers and forms.
//!
//! Every renderer is a method on [`Formation`], since rendering reads the
//! registered labels, claims access keys and looks up error messages.
//! Renderers never fail: anything missing degrades to an omitted attribute
//! or an empty fragment.

pub mod attrs;
pub mod field;
pub mod form;
mod input;
mod label;

use crate::context::Formation;
use crate::path::FieldPath;
use crate::text::{slug_segment, strip_icon_tokens, tidy_hyphens};

use self::attrs::{AttrValue, Attributes};
use self::field::FieldKind;

/// Rule names that become a `pattern` hint when they differ from the
/// element type.
const PATTERN_RULES: [&str; 5] = ["email", "integer", "url", "date", "time"];

/// Names of inputs that never get an id.
const ID_LESS_NAMES: [&str; 2] = ["_method", "_token"];

fn clean_id(id: &str) -> Option<String> {
    let id = tidy_hyphens(&strip_icon_tokens(id).replace(['(', ')'], ""));
    (!id.is_empty()).then_some(id)
}

impl Formation {
    /// Derives the element id of a field.
    ///
    /// An explicit `id` attribute wins and `id: false` means no id. Otherwise
    /// the visible segments of the name are joined with hyphens, lower-cased
    /// and prefixed with the configured id prefix.
    pub fn field_id(&self, name: &str, attributes: &Attributes) -> Option<String> {
        match attributes.get("id") {
            Some(AttrValue::Text(id)) => return clean_id(id),
            Some(AttrValue::Flag(false)) => return None,
            _ => {}
        }
        let visible = FieldPath::parse(name).visible_dotted();
        clean_id(&format!(
            "{}{}",
            self.config.field.id_prefix,
            slug_segment(&visible)
        ))
    }

    /// Adds the configured element class and the `field-<name>` class.
    pub(crate) fn add_field_class(&self, name: &str, kind: FieldKind, attributes: &mut Attributes) {
        if !matches!(kind, FieldKind::Hidden | FieldKind::Checkbox | FieldKind::Radio) {
            attributes.add_class(&self.config.field.class);
        }

        let path = FieldPath::parse(name);
        let Some(last) = path.last() else {
            return;
        };
        let mut class = slug_segment(&last.to_string());
        if path.parent_last().is_some_and(|s| s.to_string() == "pivot") {
            class = format!("pivot-{class}");
        }
        let class = tidy_hyphens(&strip_icon_tokens(&class));
        if !class.is_empty() {
            attributes.add_class(&tidy_hyphens(&format!("field-{class}")));
        }
    }

    /// Sets a placeholder from the label when automatic placeholders are on.
    pub(crate) fn add_placeholder(&self, name: &str, attributes: &mut Attributes) {
        if !self.config.field.auto_placeholder || attributes.contains("placeholder") {
            return;
        }
        let label = self.name_to_label(name);
        let label = label.strip_suffix(':').unwrap_or(&label);
        attributes.set("placeholder", label);
    }

    /// Maps the declared rules of a field to HTML validation attributes.
    pub(crate) fn add_validation_attributes(
        &self,
        name: &str,
        kind: Option<FieldKind>,
        attributes: &mut Attributes,
    ) {
        let Some(rules) = self.rules_for(name) else {
            return;
        };
        for rule in rules.iter() {
            match rule.name.as_str() {
                "required" => attributes.set("required", true),
                "regex" => {
                    if let Some(pattern) = &rule.parameter {
                        attributes.set("pattern", pattern);
                    }
                }
                other if PATTERN_RULES.contains(&other) => {
                    if kind.map(FieldKind::as_str) != Some(other) {
                        attributes.set("pattern", other);
                    }
                }
                _ => {}
            }
        }
    }

    /// Returns whether a field has a `required` rule.
    pub(crate) fn is_required(&self, name: &str) -> bool {
        self.rules_for(name).is_some_and(|rules| rules.has("required"))
    }
}
