//! # formation-model
//!
//! Connects stored records to [`formation`] forms.
//!
//! This crate provides:
//! - `FormModel`, the trait a record implements to populate a form
//! - Special field types: dates shown in the configured display formats,
//!   slugs and unique slugs
//! - Form defaults from a record and its related items
//! - Submitted input converted back to stored values
//! - Relation rows synchronised through a `RelationStore`, including
//!   join-table data
//!
//! Storage stays with the caller: records expose their attributes and
//! loaded relations, and writes go through the `RelationStore` and
//! `SlugLookup` traits.
//!
//! ## Populating a form
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use formation::{Formation, FormationConfig, RequestData, ValueTree};
//! use formation_model::{set_form_defaults, FormModel, SpecialType};
//!
//! struct Event;
//!
//! impl FormModel for Event {
//!     fn model_name(&self) -> &str {
//!         "Event"
//!     }
//!
//!     fn id(&self) -> Option<i64> {
//!         Some(1)
//!     }
//!
//!     fn attributes(&self) -> BTreeMap<String, ValueTree> {
//!         BTreeMap::from([("starts_on".to_string(), "2024-05-17".into())])
//!     }
//!
//!     fn special_types(&self) -> BTreeMap<String, SpecialType> {
//!         BTreeMap::from([("starts_on".to_string(), SpecialType::Date)])
//!     }
//! }
//!
//! let mut form = Formation::new(FormationConfig::default(), RequestData::new());
//! set_form_defaults(&mut form, &Event, &[], None);
//! assert_eq!(form.value_text("starts_on"), "05/17/2024");
//! ```

mod error;
pub mod model;
pub mod save;
pub mod sync;
pub mod types;

pub use error::{ModelError, Result};
pub use model::{
    formatted_values, prefixed_defaults, set_defaults_for_new, set_form_defaults,
    set_validation_rules, FormModel, FormattedValues,
};
pub use save::{prepare_input, save_data, unique_slug, SavedData, SlugLookup};
pub use sync::{sync_relation, sync_relation_at, RelationStore, SyncReport};
pub use types::{format_value, slug, storage_value, SpecialType, ZERO_DATE, ZERO_DATE_TIME};
