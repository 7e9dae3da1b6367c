//! Data export for the browser mirror.
//!
//! Rows rendered client-side from templates cannot go through the server
//! renderer, so the error map and the error decoration settings are exported
//! as JSON for `formation.js`, which applies the same classes, tooltips and
//! inline error elements in the browser.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::context::Formation;
use crate::error::Result;
use crate::text::dashed_to_camel;

/// The browser mirror script.
pub const SCRIPT: &str = include_str!("../assets/formation.js");

/// Renames setting keys for the browser: `class` becomes `classAttribute`
/// and dashed keys become camel case, at every depth.
fn settings_for_js(value: Value) -> Value {
    match value {
        Value::Object(settings) => Value::Object(
            settings
                .into_iter()
                .map(|(key, value)| {
                    let key = if key == "class" {
                        "classAttribute".to_string()
                    } else {
                        dashed_to_camel(&key)
                    };
                    (key, settings_for_js(value))
                })
                .collect(),
        ),
        other => other,
    }
}

/// Makes JSON safe to embed in a `<script>` element.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

/// Converts a dotted field name to the id the browser looks errors up by.
pub fn error_id(field: &str) -> String {
    field.replace(['_', '.'], "-")
}

impl Formation {
    /// Returns every error message as a JSON object.
    pub fn json_errors(&mut self) -> String {
        let errors: Map<String, Value> = self
            .errors()
            .iter()
            .map(|(field, message)| (field.to_string(), Value::from(message)))
            .collect();
        Value::Object(errors).to_string()
    }

    /// Returns every error message keyed by element id.
    pub fn errors_by_id(&mut self) -> BTreeMap<String, String> {
        self.errors()
            .iter()
            .map(|(field, message)| (error_id(field), message.to_string()))
            .collect()
    }

    /// Returns the error settings as the JSON object the browser mirror
    /// expects.
    pub fn error_settings_json(&self) -> Result<String> {
        let settings = serde_json::to_value(&self.config.error)?;
        Ok(settings_for_js(settings).to_string())
    }

    /// Returns a `<script>` element holding the browser mirror, initialised
    /// with the error settings and the current error messages.
    pub fn script_tag(&mut self) -> Result<String> {
        let settings = self.error_settings_json()?;
        let errors = self.json_errors();
        Ok(format!(
            "<script>\n{SCRIPT}\nFormation.setErrorSettings({});\nFormation.setErrors({});\n</script>\n",
            script_safe(&settings),
            script_safe(&errors)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormationConfig;
    use crate::context::RequestData;
    use crate::error::PersistedErrors;

    fn with_errors(json: &str) -> Formation {
        let persisted: PersistedErrors = serde_json::from_str(json).unwrap();
        Formation::new(
            FormationConfig::default(),
            RequestData::new().with_errors(persisted),
        )
    }

    #[test]
    fn test_json_errors() {
        let mut f = with_errors(r#"{"user.first_name": "Required", "email": "Bad"}"#);
        let json: Value = serde_json::from_str(&f.json_errors()).unwrap();
        assert_eq!(json["user.first_name"], "Required");
        assert_eq!(json["email"], "Bad");
    }

    #[test]
    fn test_errors_by_id() {
        let mut f = with_errors(r#"{"items.0.unit_price": "Too low"}"#);
        let by_id = f.errors_by_id();
        assert_eq!(by_id.get("items-0-unit-price").map(String::as_str), Some("Too low"));
    }

    #[test]
    fn test_error_settings_json() {
        let f = with_errors("{}");
        let settings: Value = serde_json::from_str(&f.error_settings_json().unwrap()).unwrap();
        assert_eq!(settings["element"], "div");
        assert_eq!(settings["elementClass"], "error");
        assert_eq!(settings["classAttribute"], "has-error");
        assert_eq!(settings["typeLabelTooltip"], false);
        assert_eq!(settings["typeLabelAttributes"]["dataToggle"], "tooltip");
        assert_eq!(settings["typeLabelAttributes"]["classAttribute"], "error-tooltip");
        assert!(settings.get("class").is_none());
    }

    #[test]
    fn test_script_tag() {
        let mut f = with_errors(r#"{"bio": "No </script> please"}"#);
        let html = f.script_tag().unwrap();
        assert!(html.starts_with("<script>\n"));
        assert!(html.contains("loadTemplates"));
        assert!(html.contains("Formation.setErrors({\"bio\":\"No <\\/script> please\"});"));
        assert_eq!(html.matches("</script>").count(), 1);
    }
}
