//! Complete fields: container, label, help text, element and error tag.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::context::Formation;
use crate::error::FormationError;
use crate::options::OptionList;
use crate::tree::ValueTree;

use super::attrs::{AttrValue, Attributes};

/// The kind of element a field renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Search,
    Password,
    Url,
    Number,
    Date,
    Textarea,
    Hidden,
    Select,
    Checkbox,
    Radio,
    CheckboxSet,
    RadioSet,
    File,
    Button,
    Submit,
    Reset,
    SelectTime,
}

impl FieldKind {
    /// Returns the kind name, which is also the `type` of input kinds.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Tel => "tel",
            Self::Search => "search",
            Self::Password => "password",
            Self::Url => "url",
            Self::Number => "number",
            Self::Date => "date",
            Self::Textarea => "textarea",
            Self::Hidden => "hidden",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::CheckboxSet => "checkbox-set",
            Self::RadioSet => "radio-set",
            Self::File => "file",
            Self::Button => "button",
            Self::Submit => "submit",
            Self::Reset => "reset",
            Self::SelectTime => "select-time",
        }
    }

    /// Infers the kind from a field name: `submit` submits, names starting
    /// with `password` are passwords, everything else is text.
    pub fn infer(name: &str) -> Self {
        if name == "submit" {
            Self::Submit
        } else if name.starts_with("password") {
            Self::Password
        } else {
            Self::Text
        }
    }

    /// Returns whether this is a single checkbox or radio button.
    pub const fn is_checkable(self) -> bool {
        matches!(self, Self::Checkbox | Self::Radio)
    }

    /// Returns whether this is a button, submit or reset.
    pub const fn is_button(self) -> bool {
        matches!(self, Self::Button | Self::Submit | Self::Reset)
    }

    /// Returns whether this renders a set of checkboxes or radio buttons.
    pub const fn is_set(self) -> bool {
        matches!(self, Self::CheckboxSet | Self::RadioSet)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = FormationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_lowercase().as_str() {
            "text" => Self::Text,
            "email" => Self::Email,
            "tel" => Self::Tel,
            "search" => Self::Search,
            "password" => Self::Password,
            "url" => Self::Url,
            "number" => Self::Number,
            "date" => Self::Date,
            "textarea" => Self::Textarea,
            "hidden" => Self::Hidden,
            "select" => Self::Select,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "checkbox-set" => Self::CheckboxSet,
            "radio-set" => Self::RadioSet,
            "file" => Self::File,
            "button" => Self::Button,
            "submit" => Self::Submit,
            "reset" => Self::Reset,
            "select-time" => Self::SelectTime,
            _ => return Err(FormationError::UnknownFieldKind(s.to_string())),
        };
        Ok(kind)
    }
}

/// How the label of a field is chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LabelOverride {
    /// Registered or derived from the name; shown unless automatic labels
    /// are switched off.
    #[default]
    Derived,
    /// Always shown with this text.
    Text(String),
    /// Never shown.
    Hidden,
}

/// Everything needed to render one complete field.
///
/// Attributes are partitioned by key suffix: `-field-container` keys go to
/// the container, `-label` keys to the label, and the rest to the element
/// with any `-field` suffix removed.
#[derive(Debug, Clone, Default)]
pub struct FieldDescriptor {
    name: String,
    kind: Option<FieldKind>,
    label: LabelOverride,
    options: OptionList,
    null_option: Option<String>,
    value: Option<ValueTree>,
    error: Option<String>,
    help: Option<String>,
    attributes: Attributes,
}

impl FieldDescriptor {
    /// Describes a field named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the kind; inferred from the name otherwise.
    #[must_use]
    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets the label text.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = LabelOverride::Text(label.into());
        self
    }

    /// Renders the field without a label.
    #[must_use]
    pub fn hide_label(mut self) -> Self {
        self.label = LabelOverride::Hidden;
        self
    }

    /// Sets the options of a select or set.
    #[must_use]
    pub fn options(mut self, options: OptionList) -> Self {
        self.options = options;
        self
    }

    /// Sets the null option of a select.
    #[must_use]
    pub fn null_option(mut self, label: impl Into<String>) -> Self {
        self.null_option = Some(label.into());
        self
    }

    /// Overrides the bound value.
    #[must_use]
    pub fn value(mut self, value: impl Into<ValueTree>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the message the error tag carries while the field has no error.
    #[must_use]
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    /// Replaces the attribute bag.
    #[must_use]
    pub fn attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Sets one attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.set(key, value);
        self
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the kind, inferred from the name when not set.
    pub fn resolved_kind(&self) -> FieldKind {
        self.kind.unwrap_or_else(|| FieldKind::infer(&self.name))
    }
}

impl Formation {
    /// Renders a complete field.
    pub fn field(&mut self, field: FieldDescriptor) -> String {
        let kind = field.resolved_kind();
        let FieldDescriptor {
            name,
            label,
            options,
            null_option,
            value,
            error,
            help,
            mut attributes,
            ..
        } = field;

        let (label, show_label) = match label {
            LabelOverride::Derived => (self.name_to_label(&name), self.config.field.auto_label),
            LabelOverride::Text(text) => (text, true),
            LabelOverride::Hidden => (String::new(), false),
        };

        let container = attributes.split_suffix("-field-container");
        let mut label_attributes = attributes.split_suffix("-label");
        let mut element = Attributes::new();
        for (key, value) in attributes.iter() {
            element.set(key.strip_suffix("-field").unwrap_or(key), value.clone());
        }
        if let Some(id) = element.get("id").cloned() {
            label_attributes.set_default("for", id);
        }

        let value_text = value.as_ref().map(ValueTree::as_text);
        let help = help
            .map(|text| self.helptext(&text, false))
            .unwrap_or_default();

        let mut html = self.open_field_container(&name, kind, container);
        let body = match kind {
            FieldKind::Hidden => self.hidden(&name, value_text.as_deref(), element),
            FieldKind::Checkbox => {
                let value = value_text.unwrap_or_else(|| "1".to_string());
                let checkbox = self.checkbox(&name, &value, false, element);
                format!("<label>{checkbox} {label}</label>{help}")
            }
            FieldKind::Radio => {
                let radio = self.radio(&name, value_text.as_deref(), false, element);
                format!("<label>{radio} {label}</label>{help}")
            }
            FieldKind::Button => self.button(&label, element),
            FieldKind::Submit => self.submit(&label, element),
            FieldKind::Reset => self.reset(&label, element),
            kind => {
                let label_html = if !show_label {
                    String::new()
                } else if kind.is_set() {
                    label_attributes.set_default("accesskey", false);
                    self.label("", Some(&label), label_attributes)
                } else {
                    self.label(&name, Some(&label), label_attributes)
                };
                let element_html = match kind {
                    FieldKind::Textarea => self.textarea(&name, value_text.as_deref(), element),
                    FieldKind::Select => self.select(
                        &name,
                        &options,
                        null_option.as_deref(),
                        value.as_ref(),
                        element,
                    ),
                    FieldKind::SelectTime => self.select_time(&name, element),
                    FieldKind::CheckboxSet => self.checkbox_set(&options, Some(&name), element),
                    FieldKind::RadioSet => {
                        self.radio_set(&name, &options, value_text.as_deref(), element)
                    }
                    FieldKind::File => self.file(&name, element) + "\n",
                    kind => self.input(kind, &name, value_text.as_deref(), element) + "\n",
                };
                format!("{label_html}{help}{element_html}")
            }
        };
        html.push_str(&body);
        html.push_str(&self.error_tag(&name, kind, error.as_deref()));
        html.push_str(&self.close_field_container());
        html
    }

    /// Opens a field container.
    ///
    /// The id is the field id suffixed with `-area` unless given or switched
    /// off. Checkbox, radio and hidden fields get a class of their kind, and
    /// the error class is added when the field has an error.
    pub fn open_field_container(
        &mut self,
        name: &str,
        kind: FieldKind,
        mut attributes: Attributes,
    ) -> String {
        let config = Arc::clone(&self.config);
        attributes.add_class(&config.field_container.class);

        match attributes.get("id") {
            None => {
                if let Some(id) = self.field_id(name, &attributes) {
                    attributes.set("id", format!("{id}-area"));
                }
            }
            Some(AttrValue::Text(id)) if !id.is_empty() => {}
            Some(_) => {
                attributes.remove("id");
            }
        }

        match kind {
            FieldKind::Checkbox | FieldKind::Radio | FieldKind::Hidden => {
                attributes.add_class(kind.as_str());
            }
            _ => {}
        }
        let attributes = self.add_error_class(name, attributes);

        format!(
            "<{}{}>\n",
            config.field_container.element,
            attributes.to_html()
        )
    }

    /// Closes a field container, preceded by a clearing div when configured.
    pub fn close_field_container(&self) -> String {
        let container = &self.config.field_container;
        let clear = if container.clear {
            "<div class=\"clear\"></div>\n"
        } else {
            ""
        };
        format!("{clear}</{}>\n", container.element)
    }
}
