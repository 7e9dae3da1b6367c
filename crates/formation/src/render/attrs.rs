//! Ordered HTML attribute bags and escaping.

use std::sync::LazyLock;

use regex::Regex;

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);")
        .expect("entity regex is valid")
});

/// Escapes HTML special characters, leaving existing entities untouched.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '&' if ENTITY.is_match(&s[i..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// Returns whether the text contains markup or characters that would be
/// changed by [`escape`].
pub fn has_markup(s: &str) -> bool {
    escape(s) != s
}

/// An attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Rendered as `key="text"`.
    Text(String),
    /// `true` renders `key="key"`; `false` suppresses the attribute and
    /// switches off behaviours keyed on it (access keys, suffixes, ids).
    Flag(bool),
}

impl AttrValue {
    /// Returns the text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Flag(_) => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for AttrValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Insertion-ordered HTML attributes. Setting an existing key keeps its
/// position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, AttrValue)>,
}

impl Attributes {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder method to set an attribute.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets an attribute only if it is not present yet.
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        let key = key.into();
        if !self.contains(&key) {
            self.set(key, value);
        }
    }

    /// Gets an attribute.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Gets a text attribute.
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_text)
    }

    /// Returns whether the attribute is present, flag or text.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns whether the attribute is explicitly switched off.
    pub fn is_disabled(&self, key: &str) -> bool {
        matches!(self.get(key), Some(AttrValue::Flag(false)))
    }

    /// Removes an attribute and returns its value.
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Removes a text attribute and returns it.
    pub fn take_text(&mut self, key: &str) -> Option<String> {
        match self.remove(key)? {
            AttrValue::Text(s) => Some(s),
            AttrValue::Flag(_) => None,
        }
    }

    /// Appends a class, creating the attribute if needed.
    pub fn add_class(&mut self, class: &str) {
        if class.is_empty() {
            return;
        }
        let merged = match self.get_text("class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set("class", merged);
    }

    /// Returns whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Splits off every attribute whose key ends with `suffix`, with the
    /// suffix removed from the key.
    pub fn split_suffix(&mut self, suffix: &str) -> Self {
        let mut split = Self::new();
        self.entries.retain(|(key, value)| match key.strip_suffix(suffix) {
            Some(stripped) => {
                split.set(stripped, value.clone());
                false
            }
            None => true,
        });
        split
    }

    /// Renders the attributes, each preceded by a space.
    pub fn to_html(&self) -> String {
        self.entries
            .iter()
            .filter_map(|(key, value)| match value {
                AttrValue::Text(text) => Some(format!(r#" {key}="{}""#, escape(text))),
                AttrValue::Flag(true) => Some(format!(r#" {key}="{key}""#)),
                AttrValue::Flag(false) => None,
            })
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<AttrValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attrs = Self::new();
        for (key, value) in iter {
            attrs.set(key, value);
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<script>"), "&lt;script&gt;");
        assert_eq!(escape("\"test\""), "&quot;test&quot;");
        assert_eq!(escape("a & b"), "a &amp; b");
        assert_eq!(escape("a &amp; b &#039;"), "a &amp; b &#039;");
        assert_eq!(escape("&nbsp;"), "&nbsp;");
    }

    #[test]
    fn test_has_markup() {
        assert!(has_markup("<b>Name</b>"));
        assert!(has_markup("Tom & Jerry"));
        assert!(!has_markup("Plain Label"));
    }

    #[test]
    fn test_order_preserved() {
        let attrs = Attributes::new()
            .with("class", "a")
            .with("id", "x")
            .with("class", "b");
        assert_eq!(attrs.to_html(), r#" class="b" id="x""#);
    }

    #[test]
    fn test_flags() {
        let attrs = Attributes::new()
            .with("required", true)
            .with("accesskey", false);
        assert_eq!(attrs.to_html(), r#" required="required""#);
        assert!(attrs.is_disabled("accesskey"));
        assert!(!attrs.is_disabled("required"));
    }

    #[test]
    fn test_add_class() {
        let mut attrs = Attributes::new();
        attrs.add_class("form-control");
        attrs.add_class("field-name");
        attrs.add_class("");
        assert_eq!(attrs.get_text("class"), Some("form-control field-name"));
    }

    #[test]
    fn test_split_suffix() {
        let mut attrs = Attributes::new()
            .with("class-label", "big")
            .with("placeholder", "Name")
            .with("id-label", "lbl");
        let label = attrs.split_suffix("-label");
        assert_eq!(label.get_text("class"), Some("big"));
        assert_eq!(label.get_text("id"), Some("lbl"));
        assert_eq!(attrs.to_html(), r#" placeholder="Name""#);
    }
}
