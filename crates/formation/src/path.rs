//! Field paths: dotted names (`a.b.0.c`) and their bracketed HTML form
//! (`a[b][0][c]`).
//!
//! A segment written in round brackets, such as the `(2)` in
//! `items.(2).name`, is an index-suppression marker. It keeps field names
//! distinct inside a set while being left out of the rendered `name` and of
//! the derived element id.

use std::fmt;

/// One path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// A sequence index.
    Index(usize),
    /// A mapping key.
    Key(String),
}

impl Segment {
    /// Parses a segment: canonical non-negative integers (`0`, `12`, but not
    /// `012`) are indices, everything else is a key.
    pub fn parse(text: &str) -> Self {
        if is_canonical_index(text) {
            if let Ok(index) = text.parse() {
                return Self::Index(index);
            }
        }
        Self::Key(text.to_string())
    }

    /// Returns the segment as a mapping key.
    pub fn to_key(&self) -> String {
        self.to_string()
    }

    /// Returns whether this is an empty key (an append slot in bracket form).
    pub fn is_empty_key(&self) -> bool {
        matches!(self, Self::Key(k) if k.is_empty())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Key(key) => f.write_str(key),
        }
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for Segment {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

fn is_canonical_index(text: &str) -> bool {
    !text.is_empty()
        && text.bytes().all(|b| b.is_ascii_digit())
        && (text == "0" || !text.starts_with('0'))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Part {
    segment: Segment,
    suppressed: bool,
}

/// An ordered sequence of segments naming a (possibly nested) field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    parts: Vec<Part>,
}

impl FieldPath {
    /// Creates an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a path from plain segments.
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self {
            parts: segments
                .into_iter()
                .map(|segment| Part {
                    segment,
                    suppressed: false,
                })
                .collect(),
        }
    }

    /// Parses a dotted name. An empty string yields an empty path.
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::new();
        }
        let parts = dotted
            .split('.')
            .map(|raw| match raw.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
                Some(inner) => Part {
                    segment: Segment::parse(inner),
                    suppressed: true,
                },
                None => Part {
                    segment: Segment::parse(raw),
                    suppressed: false,
                },
            })
            .collect();
        Self { parts }
    }

    /// Parses a bracketed HTML name such as `a[b][0][]`.
    ///
    /// An empty bracket pair becomes an empty key, which
    /// [`ValueTree::from_form_pairs`](crate::ValueTree::from_form_pairs)
    /// treats as an append slot.
    pub fn parse_bracketed(name: &str) -> Self {
        let (head, mut rest) = match name.find('[') {
            Some(pos) => (&name[..pos], &name[pos..]),
            None => (name, ""),
        };
        if head.is_empty() && rest.is_empty() {
            return Self::new();
        }

        let mut path = Self::from_segments([Segment::parse(head)]);
        while let Some(stripped) = rest.strip_prefix('[') {
            match stripped.find(']') {
                Some(end) => {
                    path.push(Segment::parse(&stripped[..end]));
                    rest = &stripped[end + 1..];
                }
                None => {
                    path.push(Segment::parse(stripped));
                    rest = "";
                }
            }
        }
        path
    }

    /// Appends a segment.
    pub fn push(&mut self, segment: impl Into<Segment>) {
        self.parts.push(Part {
            segment: segment.into(),
            suppressed: false,
        });
    }

    /// Returns a new path with `segment` appended.
    #[must_use]
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Returns this path followed by every segment of `other`.
    #[must_use]
    pub fn join(&self, other: &FieldPath) -> Self {
        let mut path = self.clone();
        path.parts.extend(other.parts.iter().cloned());
        path
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns whether the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Iterates over the segments, suppressed ones included.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.parts.iter().map(|p| &p.segment)
    }

    /// Returns the last segment.
    pub fn last(&self) -> Option<&Segment> {
        self.parts.last().map(|p| &p.segment)
    }

    /// Returns the segment before the last one.
    pub fn parent_last(&self) -> Option<&Segment> {
        self.parts
            .len()
            .checked_sub(2)
            .map(|i| &self.parts[i].segment)
    }

    /// Returns the path without its last segment.
    pub fn parent(&self) -> Option<Self> {
        if self.parts.len() < 2 {
            return None;
        }
        Some(Self {
            parts: self.parts[..self.parts.len() - 1].to_vec(),
        })
    }

    /// Returns whether any segment is an index-suppression marker.
    pub fn has_suppressed(&self) -> bool {
        self.parts.iter().any(|p| p.suppressed)
    }

    /// Dotted form, suppression markers written back in round brackets.
    pub fn dotted(&self) -> String {
        self.join_dotted(|part| {
            if part.suppressed {
                Some(format!("({})", part.segment))
            } else {
                Some(part.segment.to_string())
            }
        })
    }

    /// Dotted form used for value and error lookups: suppression brackets are
    /// dropped but the segment itself is kept.
    pub fn value_key(&self) -> String {
        self.join_dotted(|part| Some(part.segment.to_string()))
    }

    /// Dotted form with suppressed segments left out entirely.
    pub fn visible_dotted(&self) -> String {
        self.join_dotted(|part| (!part.suppressed).then(|| part.segment.to_string()))
    }

    /// Bracketed HTML `name`. Suppressed segments are dropped; a suppressed
    /// final segment becomes an append slot (`[]`).
    pub fn bracketed(&self) -> String {
        let mut visible = self.parts.iter().filter(|p| !p.suppressed);
        let Some(first) = visible.next() else {
            return String::new();
        };

        let mut name = first.segment.to_string();
        for part in visible {
            name.push('[');
            name.push_str(&part.segment.to_string());
            name.push(']');
        }
        if self.parts.len() > 1 && self.parts.last().is_some_and(|p| p.suppressed) {
            name.push_str("[]");
        }
        name
    }

    fn join_dotted(&self, render: impl Fn(&Part) -> Option<String>) -> String {
        self.parts
            .iter()
            .filter_map(render)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

impl From<&str> for FieldPath {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

/// Converts a dotted name to its bracketed HTML form.
pub fn bracket_name(dotted: &str) -> String {
    FieldPath::parse(dotted).bracketed()
}

/// Removes index-suppression brackets from a dotted name, keeping their content.
pub fn strip_suppression(dotted: &str) -> String {
    dotted.replace(['(', ')'], "")
}
