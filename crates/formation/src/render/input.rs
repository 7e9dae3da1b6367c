//! Form elements: inputs, text areas, selects, checkables and their sets.

use ironhtml::html;

use crate::context::Formation;
use crate::options::{self, strip_duplicate, OptionEntry, OptionList};
use crate::path::{strip_suppression, FieldPath};
use crate::text::{replace_icon_tokens, slug_segment};
use crate::tree::{loose_eq, ValueTree};

use super::attrs::{escape, AttrValue, Attributes};
use super::field::FieldKind;
use super::ID_LESS_NAMES;

/// Tracks which options of a select are selected.
///
/// A list value selects every member; a single value selects only the first
/// matching option, so duplicate keys do not select twice.
struct Selection {
    values: Vec<String>,
    multiple: bool,
    matched: bool,
}

impl Selection {
    fn new(value: &ValueTree) -> Self {
        match value {
            ValueTree::Scalar(scalar) => Self {
                values: vec![scalar.as_text()],
                multiple: false,
                matched: false,
            },
            tree => Self {
                values: tree.scalar_values().iter().map(|s| s.as_text()).collect(),
                multiple: true,
                matched: false,
            },
        }
    }

    fn take(&mut self, key: &str) -> bool {
        if !self.multiple && self.matched {
            return false;
        }
        let selected = self.values.iter().any(|v| loose_eq(v, key));
        self.matched |= selected;
        selected
    }
}

fn option_tag(key: &str, display: &str, selection: &mut Selection) -> String {
    let attributes = Attributes::new()
        .with("value", key)
        .with("selected", selection.take(key));
    format!("<option{}>{}</option>", attributes.to_html(), escape(display))
}

fn optgroup_tag(label: &str, options: &OptionList, selection: &mut Selection) -> String {
    let inner: String = options
        .iter()
        .map(|(key, entry)| option_tag(&strip_duplicate(key), entry.label(), selection))
        .collect();
    format!(r#"<optgroup label="{}">{inner}</optgroup>"#, escape(label))
}

/// Splits off `-container` attributes onto a set container with `class`.
fn set_container(class: &str, attributes: &mut Attributes) -> Attributes {
    let mut container = Attributes::new().with("class", class);
    for (key, value) in attributes.split_suffix("-container").iter() {
        match (key, value) {
            ("class", AttrValue::Text(extra)) => container.add_class(extra),
            (key, value) => container.set(key, value.clone()),
        }
    }
    container
}

impl Formation {
    /// Renders an `<input>`.
    ///
    /// The value defaults to the bound value of the field, except for
    /// passwords. A `name` attribute overrides the field name.
    pub fn input(
        &mut self,
        kind: FieldKind,
        name: &str,
        value: Option<&str>,
        mut attributes: Attributes,
    ) -> String {
        if !kind.is_checkable() && !kind.is_button() && kind != FieldKind::Hidden {
            self.add_placeholder(name, &mut attributes);
        }
        self.add_field_class(name, kind, &mut attributes);

        let name = attributes
            .take_text("name")
            .unwrap_or_else(|| name.to_string());

        match self.field_id(&name, &attributes) {
            Some(id) if !ID_LESS_NAMES.contains(&name.as_str()) => attributes.set("id", id),
            _ => {
                attributes.remove("id");
            }
        }

        let value = match value {
            Some(value) => Some(value.to_string()),
            None if kind == FieldKind::Password || kind.is_button() => None,
            None => Some(self.value_text(&name)),
        };

        if kind != FieldKind::Hidden {
            if let Some(key) = self.access_key(&name, None, &attributes) {
                attributes.set("accesskey", key.to_string());
            }
            self.add_validation_attributes(&name, Some(kind), &mut attributes);
        }

        attributes.set("type", kind.as_str());
        let bracketed = FieldPath::parse(&name).bracketed();
        if bracketed.is_empty() {
            attributes.remove("name");
        } else {
            attributes.set("name", bracketed);
        }
        if let Some(value) = value {
            attributes.set("value", value);
        }

        format!("<input{}>\n", attributes.to_html())
    }

    /// Renders a text input.
    pub fn text(&mut self, name: &str, value: Option<&str>, attributes: Attributes) -> String {
        self.input(FieldKind::Text, name, value, attributes)
    }

    /// Renders a password input; its value is never bound.
    pub fn password(&mut self, name: &str, attributes: Attributes) -> String {
        self.input(FieldKind::Password, name, None, attributes)
    }

    /// Renders a hidden input.
    pub fn hidden(&mut self, name: &str, value: Option<&str>, attributes: Attributes) -> String {
        self.input(FieldKind::Hidden, name, value, attributes)
    }

    /// Renders a search input.
    pub fn search(&mut self, name: &str, value: Option<&str>, attributes: Attributes) -> String {
        self.input(FieldKind::Search, name, value, attributes)
    }

    /// Renders an e-mail input.
    pub fn email(&mut self, name: &str, value: Option<&str>, attributes: Attributes) -> String {
        self.input(FieldKind::Email, name, value, attributes)
    }

    /// Renders a telephone input.
    pub fn telephone(&mut self, name: &str, value: Option<&str>, attributes: Attributes) -> String {
        self.input(FieldKind::Tel, name, value, attributes)
    }

    /// Renders a URL input.
    pub fn url(&mut self, name: &str, value: Option<&str>, attributes: Attributes) -> String {
        self.input(FieldKind::Url, name, value, attributes)
    }

    /// Renders a number input.
    pub fn number(&mut self, name: &str, value: Option<&str>, attributes: Attributes) -> String {
        self.input(FieldKind::Number, name, value, attributes)
    }

    /// Renders a date input.
    pub fn date(&mut self, name: &str, value: Option<&str>, attributes: Attributes) -> String {
        self.input(FieldKind::Date, name, value, attributes)
    }

    /// Renders a file input.
    pub fn file(&mut self, name: &str, attributes: Attributes) -> String {
        self.input(FieldKind::File, name, None, attributes)
    }

    /// Renders a `<textarea>` holding the escaped value.
    pub fn textarea(&mut self, name: &str, value: Option<&str>, mut attributes: Attributes) -> String {
        attributes.set("name", name);
        match self.field_id(name, &attributes) {
            Some(id) => attributes.set("id", id),
            None => {
                attributes.remove("id");
            }
        }
        self.add_field_class(name, FieldKind::Textarea, &mut attributes);
        self.add_placeholder(name, &mut attributes);

        let value = match value {
            Some(value) => value.to_string(),
            None => self.value_text(name),
        };

        attributes.set("name", FieldPath::parse(name).bracketed());
        if let Some(key) = self.access_key(name, None, &attributes) {
            attributes.set("accesskey", key.to_string());
        }
        self.add_validation_attributes(name, Some(FieldKind::Text), &mut attributes);

        format!("<textarea{}>{}</textarea>\n", attributes.to_html(), escape(&value))
    }

    /// Renders a `<select>`.
    ///
    /// `selected` defaults to the bound value. A list value selects every
    /// member. A null option renders first with an empty value and is also
    /// exported as `data-null-option`.
    pub fn select(
        &mut self,
        name: &str,
        options: &OptionList,
        null_option: Option<&str>,
        selected: Option<&ValueTree>,
        mut attributes: Attributes,
    ) -> String {
        if !attributes.contains("id") {
            if let Some(id) = self.field_id(name, &attributes) {
                attributes.set("id", id);
            }
        }
        attributes.set("name", name);
        self.add_field_class(name, FieldKind::Select, &mut attributes);

        let bound;
        let selected = match selected {
            Some(selected) => selected,
            None => {
                bound = self.value(name);
                &bound
            }
        };
        let mut selection = Selection::new(selected);

        let mut html = Vec::with_capacity(options.len() + 1);
        if let Some(null_option) = null_option {
            html.push(option_tag("", null_option, &mut selection));
            attributes.set("data-null-option", null_option);
        }
        for (key, entry) in options.iter() {
            let key = strip_duplicate(key);
            match entry {
                OptionEntry::Group(group) => html.push(optgroup_tag(&key, group, &mut selection)),
                entry => html.push(option_tag(&key, entry.label(), &mut selection)),
            }
        }

        attributes.set("name", FieldPath::parse(name).bracketed());
        if let Some(key) = self.access_key(name, None, &attributes) {
            attributes.set("accesskey", key.to_string());
        }
        self.add_validation_attributes(name, Some(FieldKind::Select), &mut attributes);

        format!(
            "<select{}>{}\n</select>\n",
            attributes.to_html(),
            html.join("\n")
        )
    }

    /// Renders hour, minutes and meridiem selects named `<prefix>_hour`,
    /// `<prefix>_minutes` and `<prefix>_meridiem`.
    pub fn select_time(&mut self, prefix: &str, attributes: Attributes) -> String {
        let prefix = if prefix.is_empty() || prefix.ends_with('_') {
            prefix.to_string()
        } else {
            format!("{prefix}_")
        };

        let mut hours = OptionList::new().with("12", "12");
        for hour in 1..12 {
            let hour = format!("{hour:02}");
            hours.insert(hour.clone(), hour);
        }
        hours.insert(format!("12{}", options::DUPLICATE_MARKER), "12");

        let minutes = options::simple((0..60).map(|m| format!("{m:02}")));
        let meridiem = options::simple(["am", "pm"]);

        let part = |class: &str| {
            let mut attributes = attributes.clone();
            attributes.add_class(class);
            attributes
        };
        let hour_attributes = part("time time-hour");
        let minutes_attributes = part("time time-minutes");
        let meridiem_attributes = part("time time-meridiem");

        let colon = ":";
        let separator = html! { span.class("time-hour-minutes-separator") { #colon } }.render();

        let mut html = self.select(&format!("{prefix}hour"), &hours, None, None, hour_attributes);
        html.push_str(&separator);
        html.push('\n');
        html.push_str(&self.select(
            &format!("{prefix}minutes"),
            &minutes,
            None,
            None,
            minutes_attributes,
        ));
        html.push_str(&self.select(
            &format!("{prefix}meridiem"),
            &meridiem,
            None,
            None,
            meridiem_attributes,
        ));
        html
    }

    /// Returns whether the bound value of `name` matches a checkbox value:
    /// membership for lists, loose equality otherwise.
    fn bound_matches(&self, name: &str, value: &str) -> bool {
        match self.value(name) {
            ValueTree::Scalar(scalar) => scalar.loose_eq(value),
            tree => tree.scalar_values().iter().any(|s| s.loose_eq(value)),
        }
    }

    /// Renders a checkbox, checked when asked to or when the bound value
    /// matches `value`.
    pub fn checkbox(
        &mut self,
        name: &str,
        value: &str,
        checked: bool,
        mut attributes: Attributes,
    ) -> String {
        let checked = checked || self.bound_matches(name, value);
        if !attributes.contains("id") {
            if let Some(id) = self.field_id(name, &attributes) {
                attributes.set("id", id);
            }
        }
        self.checkable(FieldKind::Checkbox, name, value, checked, attributes)
    }

    /// Renders a radio button, checked when asked to or when the bound value
    /// is exactly `value`. The value defaults to the name.
    pub fn radio(
        &mut self,
        name: &str,
        value: Option<&str>,
        checked: bool,
        mut attributes: Attributes,
    ) -> String {
        let value = value.unwrap_or(name);
        let checked = checked || self.value_text(name) == value;
        if !attributes.contains("id") {
            let id_name = format!("{name}-{}", value.to_lowercase());
            if let Some(id) = self.field_id(&id_name, &attributes) {
                attributes.set("id", id);
            }
        }
        self.checkable(FieldKind::Radio, name, value, checked, attributes)
    }

    fn checkable(
        &mut self,
        kind: FieldKind,
        name: &str,
        value: &str,
        checked: bool,
        mut attributes: Attributes,
    ) -> String {
        if checked {
            attributes.set("checked", true);
        }
        self.input(kind, name, Some(value), attributes)
    }

    /// Renders a set of checkboxes, one per option.
    ///
    /// Option keys are checkbox names and entries their labels; numeric keys
    /// (or `associative: false`) use the entry as the name instead. Each
    /// checkbox has the value `1`, or its own name with `name-values: true`.
    ///
    /// With a `prefix` ending in `.`, checkboxes are named `<prefix><name>`
    /// and checked by their own value. With any other prefix they are named
    /// `<prefix>.(<name>)`, submitted as a list, and checked by membership in
    /// the bound value of the prefix.
    pub fn checkbox_set(
        &mut self,
        names: &OptionList,
        prefix: Option<&str>,
        mut attributes: Attributes,
    ) -> String {
        if names.is_empty() {
            return String::new();
        }

        let mut container = set_container("checkbox-set", &mut attributes);
        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            container = self.add_error_class(prefix.trim_end_matches('.'), container);
        }

        let associative = match attributes.remove("associative") {
            Some(AttrValue::Flag(flag)) => Some(flag),
            _ => None,
        };
        let name_values = matches!(attributes.remove("name-values"), Some(AttrValue::Flag(true)));

        let mut html = format!("<div{}>", container.to_html());
        for (key, entry) in names.iter() {
            let is_associative =
                associative.unwrap_or_else(|| !key.chars().all(|c| c.is_ascii_digit()));
            let (name, display) = if is_associative {
                (key.to_string(), entry.label().to_string())
            } else {
                let name = entry.label().to_string();
                let display = self.name_to_label(&name);
                (name, display)
            };
            let value = if name_values { name.clone() } else { "1".to_string() };

            let (full_name, check_name) = match prefix.filter(|p| !p.is_empty()) {
                Some(prefix) if prefix.ends_with('.') => {
                    let full = format!("{prefix}{name}");
                    (full.clone(), full)
                }
                Some(prefix) => (format!("{prefix}.({name})"), prefix.to_string()),
                None => (name.clone(), name.clone()),
            };

            let checked = self.bound_matches(&check_name, &value);
            let mut item = Attributes::new().with("class", "checkbox");
            if checked {
                item.add_class("selected");
            }

            let mut checkbox_attributes = attributes.clone();
            let id = self.field_id(&strip_suppression(&full_name), &Attributes::new());
            let mut label_attributes = Attributes::new().with("accesskey", false);
            if let Some(id) = id {
                checkbox_attributes.set("id", id.clone());
                label_attributes.set("for", id);
            }

            html.push_str(&format!("<div{}>\n", item.to_html()));
            html.push_str(&self.checkbox(&full_name, &value, checked, checkbox_attributes));
            html.push_str(&self.label(&full_name, Some(&display), label_attributes));
            html.push_str("</div>\n");
        }
        html.push_str("</div>\n");
        html
    }

    /// Renders a set of radio buttons sharing one name.
    ///
    /// Ids are the field id suffixed with the option value (or `blank`).
    /// Described options render their help text inline.
    pub fn radio_set(
        &mut self,
        name: &str,
        options: &OptionList,
        selected: Option<&str>,
        mut attributes: Attributes,
    ) -> String {
        if options.is_empty() {
            return String::new();
        }

        let container = set_container("radio-set", &mut attributes);
        let container = self.add_error_class(name, container);
        let id_prefix = self.field_id(name, &attributes);
        let selected = match selected {
            Some(selected) => selected.to_string(),
            None => self.value_text(name),
        };

        let mut html = format!("<div{}>", container.to_html());
        for (value, entry) in options.iter() {
            let display = match entry {
                OptionEntry::Item(label) => label.clone(),
                OptionEntry::Described { label, help } => {
                    format!("{label}{}", self.helptext(help, true))
                }
                OptionEntry::Group(_) => {
                    tracing::debug!(name, value, "radio sets do not support option groups");
                    continue;
                }
            };

            let checked = selected == value;
            let mut item = Attributes::new().with("class", "radio");
            if checked {
                item.add_class("selected");
            }

            let suffix = match slug_segment(value) {
                s if s.is_empty() => "blank".to_string(),
                s => s,
            };
            let mut radio_attributes = attributes.clone();
            radio_attributes.set(
                "id",
                match &id_prefix {
                    Some(prefix) => format!("{prefix}-{suffix}"),
                    None => suffix,
                },
            );

            let radio = self.radio(name, Some(value), checked, radio_attributes);
            html.push_str(&format!(
                "<div{}>\n<label>{radio} {display}</label></div>\n",
                item.to_html()
            ));
        }
        html.push_str("</div>\n");
        html
    }

    /// Renders a `<button>` with the `btn btn-default` classes. Icon tokens
    /// in the value become icon markup.
    pub fn button(&mut self, value: &str, mut attributes: Attributes) -> String {
        attributes.add_class("btn btn-default");
        let value = replace_icon_tokens(&escape(value));
        format!("<button{}>{value}</button>\n", attributes.to_html())
    }

    /// Renders a submit input.
    pub fn submit(&mut self, value: &str, attributes: Attributes) -> String {
        self.input(FieldKind::Submit, "", Some(value), attributes)
    }

    /// Renders a reset input.
    pub fn reset(&mut self, value: &str, attributes: Attributes) -> String {
        self.input(FieldKind::Reset, "", Some(value), attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormationConfig;
    use crate::context::RequestData;
    use crate::tree::unflatten;

    fn formation() -> Formation {
        Formation::new(FormationConfig::default(), RequestData::new())
    }

    #[test]
    fn test_text_input() {
        let mut f = formation();
        f.set_defaults([("user.email", "ann@example.com")], &[], None);
        assert_eq!(
            f.text("user.email", None, Attributes::new()),
            "<input class=\"form-control field-email\" id=\"user-email\" accesskey=\"e\" type=\"text\" name=\"user[email]\" value=\"ann@example.com\">\n"
        );
    }

    #[test]
    fn test_password_and_hidden() {
        let mut f = formation();
        f.set_defaults([("password", "secret"), ("_token", "abc")], &[], None);
        let html = f.password("password", Attributes::new());
        assert!(!html.contains("value="));
        assert!(html.contains(r#"type="password""#));

        let html = f.hidden("_token", None, Attributes::new());
        assert_eq!(
            html,
            "<input class=\"field-token\" type=\"hidden\" name=\"_token\" value=\"abc\">\n"
        );
    }

    #[test]
    fn test_suppressed_index_name() {
        let mut f = formation();
        let html = f.text("items.(2).name", Some("x"), Attributes::new());
        assert!(html.contains(r#"name="items[name]""#));
        assert!(html.contains(r#"id="items-name""#));
    }

    #[test]
    fn test_auto_placeholder() {
        let config = FormationConfig::default().auto_placeholder(true);
        let mut f = Formation::new(config, RequestData::new());
        f.set_labels([("city", "City:")]);
        let html = f.text("city", None, Attributes::new());
        assert!(html.starts_with(r#"<input placeholder="City""#));

        let html = f.text("zip", None, Attributes::new().with("placeholder", false));
        assert!(!html.contains("placeholder"));
    }

    #[test]
    fn test_textarea_escapes_value() {
        let mut f = formation();
        let html = f.textarea("bio", Some("<b>hi</b>"), Attributes::new());
        assert_eq!(
            html,
            "<textarea name=\"bio\" id=\"bio\" class=\"form-control field-bio\" accesskey=\"b\">&lt;b&gt;hi&lt;/b&gt;</textarea>\n"
        );
    }

    #[test]
    fn test_select() {
        let mut f = formation();
        f.set_defaults([("color", "2")], &[], None);
        let options = OptionList::new()
            .with("1", "Red")
            .with("2", "Blue")
            .with("warm", OptionList::new().with("3", "Orange"));
        let html = f.select("color", &options, Some("Pick one"), None, Attributes::new());
        assert!(html.starts_with(
            "<select id=\"color\" name=\"color\" class=\"form-control field-color\" data-null-option=\"Pick one\""
        ));
        assert!(html.contains("<option value=\"\">Pick one</option>\n"));
        assert!(html.contains("<option value=\"2\" selected=\"selected\">Blue</option>"));
        assert!(html.contains("<optgroup label=\"warm\"><option value=\"3\">Orange</option></optgroup>"));
        assert!(html.ends_with("\n</select>\n"));
    }

    #[test]
    fn test_select_multiple_values() {
        let mut f = formation();
        let options = options::simple(["a", "b", "c"]);
        let selected = ValueTree::from(vec!["a", "c"]);
        let html = f.select("tags", &options, None, Some(&selected), Attributes::new());
        assert_eq!(html.matches("selected=\"selected\"").count(), 2);
    }

    #[test]
    fn test_select_time_duplicate_hour() {
        let mut f = formation();
        f.set_defaults([("start", "00:15:00")], &[], None);
        let html = f.select_time("start", Attributes::new());

        assert_eq!(html.matches("<option value=\"12\"").count(), 2);
        assert_eq!(html.matches("<option value=\"12\" selected=\"selected\">").count(), 1);
        assert!(html.contains("<option value=\"15\" selected=\"selected\">15</option>"));
        assert!(html.contains("<option value=\"am\" selected=\"selected\">am</option>"));
        assert!(html.contains("time-hour-minutes-separator"));
        assert!(html.contains("class=\"time time-hour form-control field-start-hour\""));
        assert_eq!(html.matches("id=\"start-hour\"").count(), 1);
    }

    #[test]
    fn test_checkbox() {
        let request = RequestData::new().with_form_pairs([("agree", "1")]);
        let mut f = Formation::new(FormationConfig::default(), request);
        let html = f.checkbox("agree", "1", false, Attributes::new());
        assert_eq!(
            html,
            "<input id=\"agree\" checked=\"checked\" class=\"field-agree\" accesskey=\"a\" type=\"checkbox\" name=\"agree\" value=\"1\">\n"
        );
    }

    #[test]
    fn test_radio_strict_comparison() {
        let mut f = formation();
        f.set_defaults([("size", "02")], &[], None);
        assert!(!f.radio("size", Some("2"), false, Attributes::new()).contains("checked"));
        let html = f.radio("size", Some("02"), false, Attributes::new());
        assert!(html.contains("checked=\"checked\""));
        assert!(html.contains("id=\"size-02\""));
    }

    #[test]
    fn test_checkbox_set_membership() {
        let request = RequestData::new().with_old(unflatten([("colors.0", "red"), ("colors.1", "blue")]));
        let mut f = Formation::new(FormationConfig::default(), request);
        let options = OptionList::new()
            .with("red", "Red")
            .with("green", "Green")
            .with("blue", "Blue");
        let html = f.checkbox_set(
            &options,
            Some("colors"),
            Attributes::new()
                .with("name-values", true)
                .with("class-container", "inline"),
        );

        assert!(html.starts_with("<div class=\"checkbox-set inline\">"));
        assert!(html.contains("<div class=\"checkbox selected\">\n<input id=\"colors-blue\" checked=\"checked\" class=\"field-blue\""));
        assert!(html.contains("<div class=\"checkbox\">\n<input id=\"colors-green\" class=\"field-green\""));
        assert!(html.contains("name=\"colors[]\" value=\"blue\""));
        assert!(html.contains("<label for=\"colors-green\" class=\"control-label\">Green</label>"));
        assert!(!html.contains("name-values"));
    }

    #[test]
    fn test_checkbox_set_trailing_dot_prefix() {
        let mut f = formation();
        f.set_defaults([("notify.email", true)], &[], None);
        let options = OptionList::new().with("email", "By e-mail").with("sms", "By text");
        let html = f.checkbox_set(&options, Some("notify."), Attributes::new());
        assert!(html.contains("name=\"notify[email]\" value=\"1\""));
        assert_eq!(html.matches("checked=\"checked\"").count(), 1);
        assert!(html.contains("<div class=\"checkbox selected\">"));
    }

    #[test]
    fn test_radio_set() {
        let mut f = formation();
        f.set_defaults([("plan", "pro")], &[], None);
        let options = OptionList::new()
            .with("", "None")
            .with("basic", "Basic")
            .described("pro", "Pro", "Everything included");
        let html = f.radio_set("plan", &options, None, Attributes::new());

        assert!(html.starts_with("<div class=\"radio-set\">"));
        assert!(html.contains("id=\"plan-blank\""));
        assert!(html.contains("id=\"plan-basic\""));
        assert!(html.contains("<div class=\"radio selected\">\n<label><input"));
        assert!(html.contains(" Pro<span class=\"helptext\">Everything included</span></label></div>"));
    }

    #[test]
    fn test_buttons() {
        let mut f = formation();
        assert_eq!(
            f.button("[ICON: ok]Save", Attributes::new().with("type", "submit")),
            "<button type=\"submit\" class=\"btn btn-default\"><span class=\"glyphicon glyphicon-ok\"></span>&nbsp; Save</button>\n"
        );
        assert_eq!(
            f.submit("Send", Attributes::new()),
            "<input class=\"form-control\" type=\"submit\" value=\"Send\">\n"
        );
        assert!(f.reset("Clear", Attributes::new()).contains("type=\"reset\""));
    }
}
