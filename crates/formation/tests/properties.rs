//! Behaviour guaranteed across the whole rendering pipeline.

mod common;
use common::*;

use formation::options::{self, DUPLICATE_MARKER};
use formation::{
    flatten, join_time, split_time, unflatten, Attributes, FieldKind, FieldPath, OptionList,
    ValueTree,
};

fn sorted_pairs(tree: &ValueTree) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = flatten(tree)
        .into_iter()
        .map(|(path, value)| (path.dotted(), value.as_text()))
        .collect();
    pairs.sort();
    pairs
}

#[test]
fn round_trip_reproduces_paths() {
    let mut pairs = vec![
        ("name".to_string(), "Ann".to_string()),
        ("user.email".to_string(), "ann@example.com".to_string()),
        ("user.addresses.0.city".to_string(), "Oslo".to_string()),
        ("user.addresses.1.city".to_string(), "Bergen".to_string()),
        ("a.b.c.d.e.f.g".to_string(), "deep".to_string()),
        ("tags.0".to_string(), "x".to_string()),
        ("tags.1".to_string(), "y".to_string()),
    ];
    let tree = unflatten(pairs.iter().map(|(p, v)| (p.as_str(), v.as_str())));
    pairs.sort();
    assert_eq!(sorted_pairs(&tree), pairs);
}

#[test]
fn round_trip_drops_paths_deeper_than_seven() {
    let tree = unflatten([("a.b.c.d.e.f.g.h", "too deep"), ("ok", "kept")]);
    assert_eq!(sorted_pairs(&tree), vec![("ok".to_string(), "kept".to_string())]);
}

#[test]
fn name_serialization() {
    assert_eq!(FieldPath::parse("a.b.0.c").bracketed(), "a[b][0][c]");
    assert_eq!(FieldPath::parse("items.(2).name").bracketed(), "items[name]");

    let f = page();
    assert_eq!(
        f.field_id("items.(2).name", &Attributes::new()).as_deref(),
        Some("items-name")
    );
}

#[test]
fn rendered_name_suppresses_index() {
    let mut f = page();
    let html = f.text("items.(2).name", Some("Pen"), Attributes::new());
    assert_eq!(inputs_named(&html, "items[name]").len(), 1);
    assert!(html.contains("id=\"items-name\""));
    assert!(!html.contains("items-2-name"));
}

#[test]
fn time_split_and_join() {
    assert_eq!(
        split_time("14:30:00"),
        Some(("2".to_string(), "30".to_string(), "pm".to_string()))
    );
    assert_eq!(join_time("2", "30", "pm"), "14:30:00");
    assert_eq!(join_time("12", "15", "am"), "00:15:00");
}

#[test]
fn time_defaults_read_back() {
    let mut f = page();
    f.set_defaults([("starts_at", "14:30:00")], &[], None);
    assert_eq!(f.value_text("starts_at_hour"), "2");
    assert_eq!(f.value_text("starts_at_meridiem"), "pm");
    assert_eq!(f.value_time("starts_at"), "14:30:00");

    let f = submitted(&[
        ("ends_at_hour", "12"),
        ("ends_at_minutes", "45"),
        ("ends_at_meridiem", "am"),
    ]);
    assert_eq!(f.value_time("ends_at"), "00:45:00");
}

#[test]
fn access_keys_are_unique_per_session() {
    let mut f = page();
    let mut html = String::new();
    for name in ["name", "number", "address"] {
        html += &f.label(name, None, Attributes::new());
    }
    let keys = f.access_keys();
    assert_eq!(keys.get(&'n').map(String::as_str), Some("name"));
    assert_eq!(keys.get(&'u').map(String::as_str), Some("number"));
    assert_eq!(keys.get(&'a').map(String::as_str), Some("address"));
    assert!(html.contains("N<span class=\"access\">u</span>mber"));
}

#[test]
fn checkbox_set_membership() {
    let mut f = page();
    f.set_defaults([("colors", ValueTree::from(vec!["red", "blue"]))], &[], None);
    let html = f.checkbox_set(
        &options::simple(["red", "green", "blue"]),
        Some("colors"),
        Attributes::new().with("name-values", true),
    );

    let checked: Vec<&str> = inputs_named(&html, "colors[]")
        .into_iter()
        .filter(|tag| tag.contains("checked=\"checked\""))
        .collect();
    assert_eq!(checked.len(), 2);
    assert!(checked.iter().any(|tag| tag.contains("value=\"blue\"")));
    assert!(!checked.iter().any(|tag| tag.contains("value=\"green\"")));
}

#[test]
fn default_error_precedence() {
    let mut f = page();
    f.set_validation_rules([("roles", "required")], None);
    f.set_default_errors([
        ("required", "This is required."),
        ("roles.required", "Pick at least one role."),
    ]);
    assert_eq!(
        f.default_error("roles", FieldKind::CheckboxSet).as_deref(),
        Some("Pick at least one role.")
    );

    f.set_default_errors([("required", "This is required.")]);
    assert_eq!(
        f.default_error("roles", FieldKind::CheckboxSet).as_deref(),
        Some("This is required.")
    );

    f.set_validation_rules([("nickname", "max:20")], None);
    assert_eq!(f.default_error("nickname", FieldKind::Text), None);
}

#[test]
fn duplicate_hour_option_selects_once() {
    let mut hours = OptionList::new().with("12", "12");
    hours.insert("01", "01");
    hours.insert(format!("12{DUPLICATE_MARKER}"), "12");

    let mut f = page();
    f.set_defaults([("hour", "12")], &[], None);
    let html = f.select("hour", &hours, None, None, Attributes::new());

    assert_eq!(html.matches("<option value=\"12\"").count(), 2);
    assert_eq!(html.matches("selected=\"selected\"").count(), 1);
    assert!(!html.contains(DUPLICATE_MARKER));
    assert_eq!(html.matches("id=\"").count(), 1);
}
