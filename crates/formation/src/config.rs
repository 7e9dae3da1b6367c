//! Rendering configuration.
//!
//! A [`FormationConfig`] is an immutable snapshot handed to every
//! [`Formation`](crate::Formation) context. It is usually loaded once at
//! startup from JSON (keys in kebab-case, every key optional) and shared
//! behind an `Arc`.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{FormationError, Result};

/// Formats `stamp` with a `chrono` format.
///
/// Returns `None` when the format cannot be rendered: unknown specifiers, or
/// time zone specifiers (`%Z`, `%z`) on a value without a zone.
pub fn format_date_time(stamp: NaiveDateTime, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", stamp.format(format)).ok()?;
    Some(out)
}

/// Settings for `<label>` elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LabelSettings {
    /// Text appended to every label (for example `":"`).
    pub suffix: String,
    /// Class added to every label.
    pub class: String,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            suffix: String::new(),
            class: "control-label".to_string(),
        }
    }
}

/// Settings for form elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FieldSettings {
    /// Class added to every element except hidden inputs, checkboxes and radios.
    pub class: String,
    /// Prefix prepended to every derived element id.
    pub id_prefix: String,
    /// Whether text-like elements get a placeholder derived from their label.
    pub auto_placeholder: bool,
    /// Whether [`Formation::field`](crate::Formation::field) renders labels by default.
    pub auto_label: bool,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            class: "form-control".to_string(),
            id_prefix: String::new(),
            auto_placeholder: false,
            auto_label: true,
        }
    }
}

/// Settings for the element wrapping a label, its field and its error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ContainerSettings {
    /// Tag name of the container.
    pub element: String,
    /// Class of the container.
    pub class: String,
    /// Whether a clearing `<div class="clear">` closes the container.
    pub clear: bool,
    /// Whether the live error message is rendered inside the container.
    pub error: bool,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            element: "div".to_string(),
            class: "form-group".to_string(),
            clear: false,
            error: true,
        }
    }
}

/// Settings for validation error decoration.
///
/// This block is also exported to the browser mirror, see
/// [`Formation::error_settings_json`](crate::Formation::error_settings_json).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ErrorSettings {
    /// Tag name of inline error elements.
    pub element: String,
    /// Class of inline error elements.
    pub element_class: String,
    /// Class added to containers (and labels client-side) of failing fields.
    pub class: String,
    /// Icon name prepended to error messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Whether errors are shown as label tooltips instead of inline elements.
    pub type_label_tooltip: bool,
    /// Attributes merged into a label carrying an error tooltip.
    pub type_label_attributes: BTreeMap<String, String>,
}

impl Default for ErrorSettings {
    fn default() -> Self {
        let type_label_attributes = [
            ("data-toggle", "tooltip"),
            ("data-placement", "top"),
            ("class", "error-tooltip"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            element: "div".to_string(),
            element_class: "error".to_string(),
            class: "has-error".to_string(),
            icon: None,
            type_label_tooltip: false,
            type_label_attributes,
        }
    }
}

/// Immutable configuration snapshot for a render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FormationConfig {
    /// Label settings.
    pub label: LabelSettings,
    /// Element settings.
    pub field: FieldSettings,
    /// Container settings.
    pub field_container: ContainerSettings,
    /// Error settings.
    pub error: ErrorSettings,
    /// `chrono` format used to display date values.
    pub date_format: String,
    /// `chrono` format used to display date-time values.
    pub date_time_format: String,
    /// Character encoding announced by opened forms.
    pub encoding: String,
    /// Whether resource submit labels get an icon token.
    pub auto_button_icon: bool,
    /// Whether pivot rows get `created_at`/`updated_at` when saved.
    pub pivot_timestamps: bool,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            label: LabelSettings::default(),
            field: FieldSettings::default(),
            field_container: ContainerSettings::default(),
            error: ErrorSettings::default(),
            date_format: "%m/%d/%Y".to_string(),
            date_time_format: "%m/%d/%Y %I:%M %p".to_string(),
            encoding: "UTF-8".to_string(),
            auto_button_icon: true,
            pivot_timestamps: true,
        }
    }
}

impl FormationConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the date formats can be rendered.
    pub fn validate(&self) -> Result<()> {
        for format in [&self.date_format, &self.date_time_format] {
            if format_date_time(NaiveDateTime::default(), format).is_none() {
                return Err(FormationError::InvalidDateFormat(format.clone()));
            }
        }
        Ok(())
    }

    /// Sets the id prefix.
    #[must_use]
    pub fn id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.field.id_prefix = prefix.into();
        self
    }

    /// Sets the label suffix.
    #[must_use]
    pub fn label_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.label.suffix = suffix.into();
        self
    }

    /// Enables or disables automatic placeholders.
    #[must_use]
    pub fn auto_placeholder(mut self, enabled: bool) -> Self {
        self.field.auto_placeholder = enabled;
        self
    }

    /// Switches error display to label tooltips.
    #[must_use]
    pub fn error_tooltips(mut self, enabled: bool) -> Self {
        self.error.type_label_tooltip = enabled;
        self
    }

    /// Sets the icon prepended to error messages.
    #[must_use]
    pub fn error_icon(mut self, icon: impl Into<String>) -> Self {
        self.error.icon = Some(icon.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FormationConfig::default();
        assert_eq!(config.field_container.element, "div");
        assert_eq!(config.error.class, "has-error");
        assert!(config.field.auto_label);
        assert!(!config.error.type_label_tooltip);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = FormationConfig::from_json(
            r#"{"field": {"id-prefix": "f-"}, "error": {"type-label-tooltip": true}}"#,
        )
        .unwrap();
        assert_eq!(config.field.id_prefix, "f-");
        assert_eq!(config.field.class, "form-control");
        assert!(config.error.type_label_tooltip);
        assert_eq!(config.error.element_class, "error");
    }

    #[test]
    fn test_invalid_json() {
        assert!(FormationConfig::from_json("{not json").is_err());
    }

    #[test]
    fn test_unrenderable_date_formats_are_rejected() {
        let err = FormationConfig::from_json(r#"{"date-format": "%m/%d/%Y %Z"}"#).unwrap_err();
        assert!(matches!(err, FormationError::InvalidDateFormat(ref f) if f == "%m/%d/%Y %Z"));
        assert!(FormationConfig::from_json(r#"{"date-time-format": "%Q"}"#).is_err());
        assert!(FormationConfig::from_json(r#"{"date-format": "%d.%m.%Y"}"#).is_ok());
    }

    #[test]
    fn test_format_date_time() {
        let stamp = NaiveDateTime::default();
        assert_eq!(format_date_time(stamp, "%Y-%m-%d").as_deref(), Some("1970-01-01"));
        assert_eq!(format_date_time(stamp, "%Y %z"), None);
        assert_eq!(format_date_time(stamp, "%B %Q"), None);
    }

    #[test]
    fn test_builder() {
        let config = FormationConfig::new()
            .id_prefix("x-")
            .label_suffix(":")
            .error_icon("remove");
        assert_eq!(config.field.id_prefix, "x-");
        assert_eq!(config.label.suffix, ":");
        assert_eq!(config.error.icon.as_deref(), Some("remove"));
    }
}
