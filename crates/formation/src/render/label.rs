//! Labels, access keys and help text.

use std::sync::Arc;

use ironhtml::html;

use crate::context::Formation;
use crate::path::strip_suppression;
use crate::text::{fold_accent, replace_icon_tokens, title_case};

use super::attrs::{escape, has_markup, AttrValue, Attributes};

impl Formation {
    /// Returns the label of a field: the registered one, or one derived from
    /// the last segment of its name.
    pub fn name_to_label(&self, name: &str) -> String {
        let key = strip_suppression(name);
        if let Some(label) = self.labels.get(&key).filter(|l| !l.is_empty()) {
            return label.clone();
        }
        let last = key.rsplit('.').next().unwrap_or_default();
        let label = replace_icon_tokens(&last.replace('_', " "));
        if has_markup(&label) {
            label
        } else {
            title_case(&label)
        }
    }

    /// Returns the access key of a field, claiming one if needed.
    ///
    /// The key is the first letter or digit of the label (accents folded)
    /// that no other field has claimed yet. Once claimed it is reused for
    /// the same name. `accesskey: false` disables it; an explicit text
    /// `accesskey` is used as is.
    pub fn access_key(
        &mut self,
        name: &str,
        label: Option<&str>,
        attributes: &Attributes,
    ) -> Option<char> {
        match attributes.get("accesskey") {
            Some(AttrValue::Flag(false)) => return None,
            Some(AttrValue::Text(key)) => return key.chars().next(),
            _ => {}
        }
        let name = strip_suppression(name);

        if let Some((key, _)) = self.access_keys.iter().find(|(_, owner)| **owner == name) {
            return Some(*key);
        }

        let label = match label {
            Some(label) => label.to_string(),
            None => self.name_to_label(&name),
        };
        let key = label
            .chars()
            .filter_map(|c| fold_accent(c).to_lowercase().next())
            .filter(|c| c.is_alphanumeric())
            .find(|c| !self.access_keys.contains_key(c))?;
        self.access_keys.insert(key, name);
        Some(key)
    }

    /// Renders a `<label>` for a field.
    ///
    /// Without `label`, the registered or derived label is used; a non-empty
    /// label is registered for the name. Besides regular attributes this
    /// understands `suffix: false`, `accesskey: false`,
    /// `control-label-class: false` and a `tooltip` text.
    pub fn label(&mut self, name: &str, label: Option<&str>, mut attributes: Attributes) -> String {
        let config = Arc::clone(&self.config);

        let mut text = match label {
            Some(label) => label.to_string(),
            None if name.is_empty() => String::new(),
            None => self.name_to_label(name),
        };
        if !text.is_empty() && !name.is_empty() {
            self.labels.insert(strip_suppression(name), text.clone());
        }

        if !attributes.contains("for") {
            if let Some(id) = self.field_id(name, &Attributes::new()) {
                attributes.set("for", id);
            }
        }

        if !config.label.suffix.is_empty() && !attributes.is_disabled("suffix") {
            text.push_str(&config.label.suffix);
        }
        attributes.remove("suffix");

        if config.error.type_label_tooltip {
            if let Some(message) = self.error_message(name, None, false) {
                for (key, value) in &config.error.type_label_attributes {
                    let merged = match attributes.get_text(key) {
                        Some(existing) => format!("{existing} {value}"),
                        None => value.clone(),
                    };
                    attributes.set(key.as_str(), merged);
                }
                attributes.set("title", message);
            }
        }

        if name.contains('{') || has_markup(&text) {
            attributes.set("accesskey", false);
        }
        let access_key = self.access_key(name, Some(&text), &attributes);
        attributes.remove("accesskey");

        if !attributes.is_disabled("control-label-class") {
            attributes.add_class(&config.label.class);
        }
        attributes.remove("control-label-class");
        if self.is_required(name) {
            attributes.add_class("required");
        }

        let tooltip = attributes
            .take_text("tooltip")
            .map(|tip| format!(r#"<span class="tooltip" title="{}"></span>"#, escape(&tip)))
            .unwrap_or_default();

        if text.is_empty() {
            text = "&nbsp;".to_string();
        } else if let Some(key) = access_key {
            text = highlight_access_key(&text, key);
        }

        format!("<label{}>{tooltip}{text}</label>\n", attributes.to_html())
    }

    /// Renders help text as `<p class="helptext">`, or as a `<span>` when
    /// `inline`.
    pub fn helptext(&self, text: &str, inline: bool) -> String {
        if text.is_empty() {
            return String::new();
        }
        if inline {
            html! { span.class("helptext") { #text } }.render()
        } else {
            html! { p.class("helptext") { #text } }.render()
        }
    }
}

/// Wraps the first letter of the label matching the key, upper case first.
/// Accented letters match their base letter and are kept as written.
fn highlight_access_key(label: &str, key: char) -> String {
    let found = key.to_uppercase().chain(key.to_lowercase()).find_map(|candidate| {
        label
            .char_indices()
            .find(|&(_, c)| fold_accent(c) == candidate)
    });
    match found {
        Some((pos, c)) => format!(
            r#"{}<span class="access">{c}</span>{}"#,
            &label[..pos],
            &label[pos + c.len_utf8()..]
        ),
        None => label.to_string(),
    }
}
