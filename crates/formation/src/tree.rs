//! Nested value trees and their flat `(path, scalar)` form.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::path::{FieldPath, Segment};

/// Deepest path [`unflatten`] will place into a tree.
pub const MAX_DEPTH: usize = 7;

/// A leaf value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Returns the value as rendered into markup: `true` is `"1"`, `false` is
    /// empty.
    pub fn as_text(&self) -> String {
        match self {
            Self::Bool(true) => "1".to_string(),
            Self::Bool(false) => String::new(),
            Self::Int(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Returns whether the value counts as "on": everything except `false`,
    /// zero, the empty string and `"0"`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(n) => *n != 0.0,
            Self::Text(s) => !s.is_empty() && s != "0",
        }
    }

    /// Returns whether the value is empty text.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }

    /// Loose comparison against a rendered option value.
    pub fn loose_eq(&self, other: &str) -> bool {
        match self {
            Self::Bool(b) => {
                let other = Self::Text(other.to_string());
                *b == other.is_truthy()
            }
            _ => loose_eq(&self.as_text(), other),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Compares two strings numerically when both are numbers, textually otherwise.
pub fn loose_eq(left: &str, right: &str) -> bool {
    if left == right {
        return true;
    }
    match (left.trim().parse::<f64>(), right.trim().parse::<f64>()) {
        (Ok(l), Ok(r)) if !left.trim().is_empty() && !right.trim().is_empty() => l == r,
        _ => false,
    }
}

/// A scalar, a sequence or a mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueTree {
    Scalar(Scalar),
    Seq(BTreeMap<usize, ValueTree>),
    Map(BTreeMap<String, ValueTree>),
}

impl Default for ValueTree {
    fn default() -> Self {
        Self::Map(BTreeMap::new())
    }
}

impl ValueTree {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from raw `name=value` pairs in bracket notation.
    ///
    /// An empty bracket pair (`tags[]`) appends to the sequence at that level.
    pub fn from_form_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut root = Self::new();
        for (name, value) in pairs {
            let path = FieldPath::parse_bracketed(name.as_ref());
            if path.is_empty() {
                continue;
            }
            let segments: Vec<Segment> = path.segments().cloned().collect();
            root.insert(&segments, Scalar::Text(value.into()), true);
        }
        root
    }

    /// Converts a JSON value. `null` becomes `None` and null members are
    /// skipped.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Scalar(Scalar::Bool(*b))),
            Value::Number(n) => Some(Self::Scalar(match n.as_i64() {
                Some(i) => Scalar::Int(i),
                None => Scalar::Float(n.as_f64().unwrap_or_default()),
            })),
            Value::String(s) => Some(Self::Scalar(Scalar::Text(s.clone()))),
            Value::Array(items) => Some(Self::Seq(
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| Self::from_json(item).map(|t| (i, t)))
                    .collect(),
            )),
            Value::Object(map) => Some(Self::Map(
                map.iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|t| (k.clone(), t)))
                    .collect(),
            )),
        }
    }

    /// Converts to JSON. Dense sequences become arrays, sparse ones objects.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            Self::Scalar(Scalar::Int(n)) => Value::from(*n),
            Self::Scalar(Scalar::Float(n)) => Value::from(*n),
            Self::Scalar(Scalar::Text(s)) => Value::String(s.clone()),
            Self::Seq(items) => {
                let dense = items.keys().enumerate().all(|(i, k)| i == *k);
                if dense {
                    Value::Array(items.values().map(Self::to_json).collect())
                } else {
                    Value::Object(
                        items
                            .iter()
                            .map(|(k, v)| (k.to_string(), v.to_json()))
                            .collect(),
                    )
                }
            }
            Self::Map(items) => Value::Object(
                items
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Returns the leaf value, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the text of a scalar, or `""` for containers.
    pub fn as_text(&self) -> String {
        self.as_scalar().map(Scalar::as_text).unwrap_or_default()
    }

    /// Returns whether this is an empty container or empty text.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(s) => s.is_empty(),
            Self::Seq(items) => items.is_empty(),
            Self::Map(items) => items.is_empty(),
        }
    }

    /// Returns the scalars directly held by a container, in order.
    pub fn scalar_values(&self) -> Vec<&Scalar> {
        match self {
            Self::Scalar(s) => vec![s],
            Self::Seq(items) => items.values().filter_map(Self::as_scalar).collect(),
            Self::Map(items) => items.values().filter_map(Self::as_scalar).collect(),
        }
    }

    /// Returns the direct children with their segments.
    pub fn children(&self) -> Vec<(Segment, &ValueTree)> {
        match self {
            Self::Scalar(_) => Vec::new(),
            Self::Seq(items) => items.iter().map(|(i, t)| (Segment::Index(*i), t)).collect(),
            Self::Map(items) => items.iter().map(|(k, t)| (Segment::parse(k), t)).collect(),
        }
    }

    /// Looks up the subtree at `path`.
    pub fn get(&self, path: &FieldPath) -> Option<&ValueTree> {
        path.segments().try_fold(self, |node, segment| node.child(segment))
    }

    /// Looks up the subtree at a dotted name.
    pub fn get_dotted(&self, dotted: &str) -> Option<&ValueTree> {
        self.get(&FieldPath::parse(dotted))
    }

    fn child(&self, segment: &Segment) -> Option<&ValueTree> {
        match (self, segment) {
            (Self::Seq(items), Segment::Index(i)) => items.get(i),
            (Self::Map(items), segment) => items.get(&segment.to_key()),
            _ => None,
        }
    }

    /// Places `value` at `path`, creating containers on the way.
    pub fn set(&mut self, path: &FieldPath, value: impl Into<Scalar>) {
        let segments: Vec<Segment> = path.segments().cloned().collect();
        if segments.is_empty() {
            return;
        }
        self.insert(&segments, value.into(), false);
    }

    /// Places a whole subtree at `path`, replacing what was there.
    pub fn set_tree(&mut self, path: &FieldPath, tree: &ValueTree) {
        match tree {
            ValueTree::Scalar(value) => self.set(path, value.clone()),
            _ => {
                for (child, value) in flatten(tree) {
                    self.set(&path.join(&child), value);
                }
            }
        }
    }

    /// Merges every leaf of `other` into this tree; `other` wins on conflicts.
    pub fn merge(&mut self, other: &ValueTree) {
        for (path, value) in flatten(other) {
            self.set(&path, value);
        }
    }

    fn insert(&mut self, segments: &[Segment], value: Scalar, append: bool) {
        let Some((first, rest)) = segments.split_first() else {
            *self = Self::Scalar(value);
            return;
        };

        let first = if append && first.is_empty_key() {
            Segment::Index(self.next_index())
        } else {
            first.clone()
        };
        self.make_container_for(&first);

        let placeholder = || match rest.first() {
            Some(next) => Self::empty_for(next),
            None => Self::Scalar(Scalar::Text(String::new())),
        };
        let child = match (self, first) {
            (Self::Seq(items), Segment::Index(i)) => items.entry(i).or_insert_with(placeholder),
            (Self::Map(items), segment) => {
                items.entry(segment.to_key()).or_insert_with(placeholder)
            }
            _ => return,
        };
        child.insert(rest, value, append);
    }

    fn next_index(&self) -> usize {
        match self {
            Self::Seq(items) => items.keys().next_back().map_or(0, |last| last + 1),
            Self::Map(items) => items
                .keys()
                .filter_map(|k| match Segment::parse(k) {
                    Segment::Index(i) => Some(i + 1),
                    Segment::Key(_) => None,
                })
                .max()
                .unwrap_or(0),
            Self::Scalar(_) => 0,
        }
    }

    fn make_container_for(&mut self, segment: &Segment) {
        let replacement = match (&*self, segment) {
            (Self::Scalar(_), _) => Self::empty_for(segment),
            (Self::Seq(items), Segment::Key(_)) => Self::Map(
                items
                    .iter()
                    .map(|(i, t)| (i.to_string(), t.clone()))
                    .collect(),
            ),
            _ => return,
        };
        *self = replacement;
    }

    fn empty_for(segment: &Segment) -> Self {
        match segment {
            Segment::Index(_) => Self::Seq(BTreeMap::new()),
            Segment::Key(_) => Self::Map(BTreeMap::new()),
        }
    }
}

impl Serialize for ValueTree {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ValueTree {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value).unwrap_or_default())
    }
}

impl From<Scalar> for ValueTree {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for ValueTree {
    fn from(value: &str) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<String> for ValueTree {
    fn from(value: String) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<bool> for ValueTree {
    fn from(value: bool) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<i64> for ValueTree {
    fn from(value: i64) -> Self {
        Self::Scalar(value.into())
    }
}

impl<T: Into<ValueTree>> From<Vec<T>> for ValueTree {
    fn from(values: Vec<T>) -> Self {
        Self::Seq(values.into_iter().map(Into::into).enumerate().collect())
    }
}

/// Flattens a tree into `(path, scalar)` pairs, in tree order.
///
/// Empty containers contribute nothing. A root scalar yields one pair with an
/// empty path.
pub fn flatten(tree: &ValueTree) -> Vec<(FieldPath, Scalar)> {
    let mut pairs = Vec::new();
    flatten_into(tree, FieldPath::new(), &mut pairs);
    pairs
}

fn flatten_into(tree: &ValueTree, prefix: FieldPath, pairs: &mut Vec<(FieldPath, Scalar)>) {
    match tree {
        ValueTree::Scalar(value) => pairs.push((prefix, value.clone())),
        _ => {
            for (segment, child) in tree.children() {
                flatten_into(child, prefix.child(segment), pairs);
            }
        }
    }
}

/// Builds a tree from `(path, scalar)` pairs.
///
/// Paths deeper than [`MAX_DEPTH`] and empty paths are dropped with a
/// warning. Later pairs overwrite earlier ones at the same path.
pub fn unflatten<I, P, S>(pairs: I) -> ValueTree
where
    I: IntoIterator<Item = (P, S)>,
    P: Into<FieldPath>,
    S: Into<Scalar>,
{
    let mut root = ValueTree::new();
    for (path, value) in pairs {
        let path = path.into();
        if path.is_empty() {
            warn!("dropping value with an empty field path");
            continue;
        }
        if path.len() > MAX_DEPTH {
            warn!(
                path = %path,
                depth = path.len(),
                max = MAX_DEPTH,
                "dropping value nested deeper than the supported depth"
            );
            continue;
        }
        root.set(&path, value);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut pairs: Vec<(FieldPath, Scalar)>) -> Vec<(String, String)> {
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
            .into_iter()
            .map(|(p, s)| (p.dotted(), s.as_text()))
            .collect()
    }

    #[test]
    fn test_unflatten_nested() {
        let tree = unflatten([
            ("user.name", "Ann"),
            ("user.addresses.0.city", "Oslo"),
            ("user.addresses.1.city", "Rome"),
        ]);
        assert_eq!(tree.get_dotted("user.name").unwrap().as_text(), "Ann");
        assert!(matches!(
            tree.get_dotted("user.addresses"),
            Some(ValueTree::Seq(_))
        ));
        assert_eq!(
            tree.get_dotted("user.addresses.1.city").unwrap().as_text(),
            "Rome"
        );
    }

    #[test]
    fn test_round_trip() {
        let pairs = vec![
            ("a.b.0.c", "1"),
            ("a.b.1.c", "2"),
            ("a.d", "x"),
            ("e", "y"),
            ("f.0", "z"),
        ];
        let tree = unflatten(pairs.clone());
        let flat = sorted(flatten(&tree));
        let mut expected: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(p, v)| (p.to_string(), v.to_string()))
            .collect();
        expected.sort_by(|a, b| FieldPath::parse(&a.0).cmp(&FieldPath::parse(&b.0)));
        assert_eq!(flat, expected);
    }

    #[test]
    fn test_depth_limit_drops_deep_paths() {
        let tree = unflatten([("a.b.c.d.e.f.g", "seven"), ("a.b.c.d.e.f.g.h", "eight")]);
        let flat = flatten(&tree);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].0.dotted(), "a.b.c.d.e.f.g");
    }

    #[test]
    fn test_mixed_keys_degrade_to_map() {
        let tree = unflatten([("list.0", "first"), ("list.extra", "second")]);
        match tree.get_dotted("list") {
            Some(ValueTree::Map(items)) => {
                assert_eq!(items.len(), 2);
                assert!(items.contains_key("0"));
            }
            other => panic!("expected a map, got {other:?}"),
        }
        assert_eq!(tree.get_dotted("list.0").unwrap().as_text(), "first");
    }

    #[test]
    fn test_from_form_pairs_appends() {
        let tree = ValueTree::from_form_pairs([
            ("tags[]", "red"),
            ("tags[]", "blue"),
            ("user[name]", "Ann"),
        ]);
        assert_eq!(tree.get_dotted("tags.0").unwrap().as_text(), "red");
        assert_eq!(tree.get_dotted("tags.1").unwrap().as_text(), "blue");
        assert_eq!(tree.get_dotted("user.name").unwrap().as_text(), "Ann");
    }

    #[test]
    fn test_json_conversion() {
        let tree = unflatten([("tags.0", "a"), ("tags.1", "b"), ("name", "n")]);
        assert_eq!(
            tree.to_json(),
            serde_json::json!({"name": "n", "tags": ["a", "b"]})
        );

        let sparse = unflatten([("items.2", "x")]);
        assert_eq!(sparse.to_json(), serde_json::json!({"items": {"2": "x"}}));

        let back = ValueTree::from_json(&serde_json::json!({"n": 1, "ok": true})).unwrap();
        assert_eq!(back.get_dotted("n").unwrap().as_scalar(), Some(&Scalar::Int(1)));
    }

    #[test]
    fn test_loose_eq() {
        assert!(loose_eq("02", "2"));
        assert!(loose_eq("1.0", "1"));
        assert!(!loose_eq("a", "b"));
        assert!(!loose_eq("", "0"));
        assert!(Scalar::Bool(true).loose_eq("1"));
        assert!(Scalar::Int(3).loose_eq("03"));
    }

    #[test]
    fn test_truthiness() {
        assert!(Scalar::from("yes").is_truthy());
        assert!(!Scalar::from("0").is_truthy());
        assert!(!Scalar::from("").is_truthy());
        assert!(!Scalar::Bool(false).is_truthy());
    }

    #[test]
    fn test_merge_overrides() {
        let mut base = unflatten([("a", "1"), ("b.c", "2")]);
        base.merge(&unflatten([("b.c", "3")]));
        assert_eq!(base.get_dotted("b.c").unwrap().as_text(), "3");
        assert_eq!(base.get_dotted("a").unwrap().as_text(), "1");
    }
}
