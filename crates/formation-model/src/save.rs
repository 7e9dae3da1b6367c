//! Preparing submitted input for storage.

use std::collections::BTreeMap;

use formation::text::underscored_to_camel;
use formation::{FormationConfig, ValueTree};
use tracing::debug;

use crate::error::{ModelError, Result};
use crate::model::FormModel;
use crate::sync::{sync_relation, RelationStore, SyncReport};
use crate::types::{slug, storage_value, SpecialType};

/// Highest numeric suffix tried when making a slug unique.
pub const MAX_SLUG_SUFFIX: u32 = 10_000;

/// Answers whether a slug is already used.
pub trait SlugLookup {
    /// Returns whether `slug` is stored in `table.field` by a record other
    /// than `except`.
    fn slug_taken(&self, table: &str, field: &str, slug: &str, except: Option<i64>) -> Result<bool>;
}

/// Slugifies `text` and appends `-2`, `-3`, ... until the slug is free in
/// `table.field`.
pub fn unique_slug(
    lookup: &dyn SlugLookup,
    text: &str,
    table: &str,
    field: &str,
    except: Option<i64>,
) -> Result<String> {
    let base = slug(text);
    if !lookup.slug_taken(table, field, &base, except)? {
        return Ok(base);
    }
    for suffix in 2..=MAX_SLUG_SUFFIX {
        let candidate = format!("{base}-{suffix}");
        if !lookup.slug_taken(table, field, &candidate, except)? {
            return Ok(candidate);
        }
    }
    Err(ModelError::SlugExhausted(base))
}

/// Converts the special-typed fields of submitted input to their stored
/// form, in place.
///
/// Display dates become `Y-m-d` or `Y-m-d H:i:s` and empty dates the zero
/// date. Slug fields are slugified; unique slugs are checked against the
/// model's table, ignoring the model itself.
pub fn prepare_input(
    model: &dyn FormModel,
    input: &mut BTreeMap<String, ValueTree>,
    config: &FormationConfig,
    slugs: &dyn SlugLookup,
) -> Result<()> {
    for (field, kind) in model.special_types() {
        let Some(text) = input.get(&field).and_then(ValueTree::as_scalar).map(|s| s.as_text())
        else {
            continue;
        };
        let stored = match kind {
            SpecialType::Date | SpecialType::DateTime => storage_value(&field, &text, kind, config)?,
            SpecialType::Slug => slug(&text),
            SpecialType::UniqueSlug => {
                unique_slug(slugs, &text, &model.table(), &field, model.id())?
            }
        };
        input.insert(field, stored.into());
    }
    Ok(())
}

/// Submitted input split into record fields and synchronised relations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedData {
    /// Prepared fields for the record itself.
    pub fields: BTreeMap<String, ValueTree>,
    /// What each synchronised relation changed, keyed by relation name.
    pub relations: BTreeMap<String, SyncReport>,
}

/// Prepares submitted input for `owner` and synchronises its relations.
///
/// A nested field named after a loaded relation (`user_roles` for
/// `userRoles`) is synchronised through the store; every other field is
/// returned for the caller to save on the record.
pub fn save_data<S>(
    owner: &dyn FormModel,
    mut input: BTreeMap<String, ValueTree>,
    config: &FormationConfig,
    store: &mut S,
) -> Result<SavedData>
where
    S: SlugLookup + RelationStore,
{
    prepare_input(owner, &mut input, config, &*store)?;

    let relations = owner.relations();
    let mut saved = SavedData::default();
    for (field, value) in input {
        if value.as_scalar().is_none() {
            let relation = underscored_to_camel(&field);
            if relations.contains(&relation) {
                let report = sync_relation(owner, &relation, &value, &mut *store, config)?;
                saved.relations.insert(relation, report);
                continue;
            }
            debug!(field = %field, "nested input is not a loaded relation");
        }
        saved.fields.insert(field, value);
    }
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    struct Taken(BTreeSet<&'static str>);

    impl SlugLookup for Taken {
        fn slug_taken(&self, table: &str, field: &str, slug: &str, except: Option<i64>) -> Result<bool> {
            assert_eq!((table, field, except), ("articles", "slug", Some(4)));
            Ok(self.0.contains(slug))
        }
    }

    struct Article;

    impl FormModel for Article {
        fn model_name(&self) -> &str {
            "Article"
        }

        fn id(&self) -> Option<i64> {
            Some(4)
        }

        fn attributes(&self) -> BTreeMap<String, ValueTree> {
            BTreeMap::new()
        }

        fn special_types(&self) -> BTreeMap<String, SpecialType> {
            BTreeMap::from([
                ("published_on".to_string(), SpecialType::Date),
                ("slug".to_string(), SpecialType::UniqueSlug),
                ("tag".to_string(), SpecialType::Slug),
            ])
        }
    }

    #[test]
    fn test_unique_slug() {
        let lookup = Taken(BTreeSet::from(["hello-world", "hello-world-2"]));
        assert_eq!(
            unique_slug(&lookup, "Hello World", "articles", "slug", Some(4)).unwrap(),
            "hello-world-3"
        );
        assert_eq!(
            unique_slug(&lookup, "Fresh", "articles", "slug", Some(4)).unwrap(),
            "fresh"
        );
    }

    #[test]
    fn test_prepare_input() {
        let lookup = Taken(BTreeSet::from(["my-post"]));
        let mut input = BTreeMap::from([
            ("published_on".to_string(), ValueTree::from("")),
            ("slug".to_string(), ValueTree::from("My Post")),
            ("tag".to_string(), ValueTree::from("Rust Lang")),
            ("title".to_string(), ValueTree::from("My Post")),
        ]);
        prepare_input(&Article, &mut input, &FormationConfig::default(), &lookup).unwrap();

        assert_eq!(input["published_on"].as_text(), "0000-00-00");
        assert_eq!(input["slug"].as_text(), "my-post-2");
        assert_eq!(input["tag"].as_text(), "rust-lang");
        assert_eq!(input["title"].as_text(), "My Post");
    }

    #[test]
    fn test_prepare_input_rejects_bad_date() {
        let lookup = Taken(BTreeSet::new());
        let mut input = BTreeMap::from([("published_on".to_string(), ValueTree::from("someday"))]);
        let err = prepare_input(&Article, &mut input, &FormationConfig::default(), &lookup)
            .unwrap_err();
        assert!(err.to_string().contains("published_on"));
    }
}
