//! The model trait and the form defaults built from models.

use std::collections::BTreeMap;

use formation::text::camel_to_snake;
use formation::{Formation, FormationConfig, RelationDefaults, RuleSet, ValueTree, FORMATTED_SUFFIX};
use tracing::debug;

use crate::types::{format_value, SpecialType};

/// A stored record that can populate and receive a form.
///
/// Only [`model_name`](FormModel::model_name), [`id`](FormModel::id) and
/// [`attributes`](FormModel::attributes) are required.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use formation::ValueTree;
/// use formation_model::FormModel;
///
/// struct BlogPost {
///     id: i64,
///     title: String,
/// }
///
/// impl FormModel for BlogPost {
///     fn model_name(&self) -> &str {
///         "BlogPost"
///     }
///
///     fn id(&self) -> Option<i64> {
///         Some(self.id)
///     }
///
///     fn attributes(&self) -> BTreeMap<String, ValueTree> {
///         BTreeMap::from([("title".to_string(), self.title.clone().into())])
///     }
/// }
///
/// let post = BlogPost { id: 1, title: "Hi".into() };
/// assert_eq!(post.foreign_key(), "blog_post_id");
/// assert_eq!(post.table(), "blog_posts");
/// ```
pub trait FormModel {
    /// Type name in camel case, e.g. `UserRole`.
    fn model_name(&self) -> &str;

    /// Primary key, or `None` for an unsaved record.
    fn id(&self) -> Option<i64>;

    /// Current attribute values keyed by field name.
    fn attributes(&self) -> BTreeMap<String, ValueTree>;

    /// Table holding the records.
    fn table(&self) -> String {
        format!("{}s", camel_to_snake(self.model_name()))
    }

    /// Fields whose values are converted between storage and forms.
    fn special_types(&self) -> BTreeMap<String, SpecialType> {
        BTreeMap::new()
    }

    /// Column referencing this model from a join table.
    fn foreign_key(&self) -> String {
        format!("{}_id", camel_to_snake(self.model_name()))
    }

    /// Names of the loaded relations, in camel case.
    fn relations(&self) -> Vec<String> {
        Vec::new()
    }

    /// Loaded items of a relation.
    fn related(&self, _relation: &str) -> Vec<&dyn FormModel> {
        Vec::new()
    }

    /// Join-table fields when this record was loaded through a pivot.
    fn pivot(&self) -> Option<BTreeMap<String, ValueTree>> {
        None
    }

    /// Defaults for a new record.
    fn defaults(&self) -> BTreeMap<String, ValueTree> {
        BTreeMap::new()
    }

    /// Validation rules for this record.
    fn validation_rules(&self) -> Vec<(String, RuleSet)> {
        Vec::new()
    }
}

/// A model's values ready to become form defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormattedValues {
    /// Attributes, with special-typed fields in display format.
    pub values: BTreeMap<String, ValueTree>,
    /// Related items, with `<field>_formatted` copies of special-typed fields.
    pub relations: Vec<RelationDefaults>,
}

fn formatted(value: &ValueTree, kind: SpecialType, config: &FormationConfig) -> Option<ValueTree> {
    value
        .as_scalar()
        .map(|s| format_value(&s.as_text(), kind, config).into())
}

/// Formats a model's values for a form.
///
/// Special-typed attributes are replaced by their display form. Items of the
/// named relations keep their stored values and gain a display copy under
/// `<field>_formatted`, which the defaults collapse back onto the field.
pub fn formatted_values(
    model: &dyn FormModel,
    relations: &[&str],
    config: &FormationConfig,
) -> FormattedValues {
    let mut values = model.attributes();
    for (field, kind) in model.special_types() {
        if let Some(display) = values.get(&field).and_then(|v| formatted(v, kind, config)) {
            values.insert(field, display);
        }
    }

    let relations = relations
        .iter()
        .map(|&name| {
            let items = model.related(name);
            if items.is_empty() {
                debug!(relation = name, "relation has no loaded items");
            }
            let mut defaults = RelationDefaults::new(name);
            for item in items {
                let mut fields = item.attributes();
                for (field, kind) in item.special_types() {
                    if let Some(display) = fields.get(&field).and_then(|v| formatted(v, kind, config)) {
                        fields.insert(format!("{field}{FORMATTED_SUFFIX}"), display);
                    }
                }
                if let Some(pivot) = item.pivot() {
                    fields.insert("pivot".to_string(), ValueTree::Map(pivot));
                }
                defaults = defaults.item(fields);
            }
            defaults
        })
        .collect();

    FormattedValues { values, relations }
}

/// Seeds a form with a model's formatted values and the named relations.
pub fn set_form_defaults(
    form: &mut Formation,
    model: &dyn FormModel,
    relations: &[&str],
    prefix: Option<&str>,
) {
    let formatted = formatted_values(model, relations, form.config());
    form.set_defaults(formatted.values, &formatted.relations, prefix);
}

/// Seeds a form with the defaults of a new record.
pub fn set_defaults_for_new(form: &mut Formation, model: &dyn FormModel, prefix: Option<&str>) {
    form.set_defaults(model.defaults(), &[], prefix);
}

/// Prepends `prefix.` to every default name.
pub fn prefixed_defaults<K, V>(
    defaults: impl IntoIterator<Item = (K, V)>,
    prefix: Option<&str>,
) -> BTreeMap<String, ValueTree>
where
    K: AsRef<str>,
    V: Into<ValueTree>,
{
    let prefix = match prefix {
        Some(p) if !p.is_empty() => format!("{p}."),
        _ => String::new(),
    };
    defaults
        .into_iter()
        .map(|(field, value)| (format!("{prefix}{}", field.as_ref()), value.into()))
        .collect()
}

/// Hands a model's validation rules to the form.
pub fn set_validation_rules(form: &mut Formation, model: &dyn FormModel) {
    form.set_validation_rules(model.validation_rules(), None);
}
