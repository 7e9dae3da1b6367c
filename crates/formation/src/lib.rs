//! # formation
//!
//! Server-side form markup generation with value binding and inline
//! validation errors.
//!
//! This crate provides:
//! - Field names in dot notation (`user.addresses.0.city`) mapped to HTML
//!   names, ids and nested value trees
//! - Labels, access keys, inputs, selects, checkbox and radio sets
//! - Values bound from defaults, submitted input and flashed input
//! - Validation rules turned into HTML attributes and error messages
//! - Option tables (numbers, times, months, countries, states)
//! - A browser script mirroring the error decoration for client-side rows
//!
//! ## Quick Start
//!
//! ```rust
//! use formation::{FieldDescriptor, FieldKind, FormOptions, Formation, FormationConfig, RequestData};
//!
//! let mut form = Formation::new(FormationConfig::default(), RequestData::new());
//! form.set_labels([("user.email", "E-mail")]);
//! form.set_defaults([("user.email", "ann@example.com")], &[], None);
//! form.set_validation_rules([("user.email", "required|email")], None);
//!
//! let mut html = form.open(FormOptions::new().action("/profile"));
//! html += &form.field(FieldDescriptor::new("user.email").kind(FieldKind::Email));
//! html += &form.close();
//!
//! assert!(html.contains(r#"name="user[email]""#));
//! assert!(html.contains(r#"value="ann@example.com""#));
//! assert!(html.contains(r#"required="required""#));
//! ```
//!
//! ## Nested values
//!
//! ```rust
//! use formation::{flatten, unflatten, ValueTree};
//!
//! let tree = unflatten([("items.0.name", "Pen"), ("items.1.name", "Ink")]);
//! assert_eq!(tree.get_dotted("items.1.name").map(ValueTree::as_text).as_deref(), Some("Ink"));
//! assert_eq!(flatten(&tree).len(), 2);
//! ```
//!
//! ## Errors after a failed submission
//!
//! ```rust
//! use formation::{Attributes, Formation, FormationConfig, RequestData};
//!
//! let request = RequestData::new().with_form_pairs([("name", "")]);
//! let mut form = Formation::new(FormationConfig::default(), request);
//! form.set_validation_rules([("name", "required")], None);
//!
//! assert!(!form.validated(None));
//! assert_eq!(form.error("name"), Some("The Name field is required."));
//! let container = form.add_error_class("name", Attributes::new());
//! assert_eq!(container.get_text("class"), Some("has-error"));
//! ```

pub mod client;
pub mod config;
mod context;
mod error;
mod errors;
pub mod options;
pub mod path;
pub mod render;
pub mod text;
pub mod tree;
pub mod validation;
mod values;

pub use config::{format_date_time, FormationConfig};
pub use context::{Formation, RequestData};
pub use error::{ErrorMap, FormationError, PersistedErrors, Result};
pub use options::{OptionEntry, OptionList};
pub use path::{FieldPath, Segment};
pub use render::attrs::{AttrValue, Attributes};
pub use render::field::{FieldDescriptor, FieldKind, LabelOverride};
pub use render::form::{FormOptions, Method, ResourceRoute};
pub use tree::{flatten, unflatten, Scalar, ValueTree, MAX_DEPTH};
pub use validation::{
    Rule, RuleSet, RuleValidator, RuleValidatorFactory, ValidationGroup, Validator,
    ValidatorFactory,
};
pub use values::{join_time, split_time, FieldSetup, RelationDefaults, ValueSpec, FORMATTED_SUFFIX};
