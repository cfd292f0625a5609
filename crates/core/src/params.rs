//! Query string decomposition
//!
//! Turns a raw `name=value&name=value` string into an ordered
//! [`ParameterMap`]. Bracketed names (`group[item]=v`) become nested maps
//! instead of being flattened, so later stages can reason about the
//! top-level name only.
//!
//! Decomposition is total: malformed escapes, stray delimiters and broken
//! bracket chains are kept best-effort rather than rejected.

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::fmt;

/// Deepest bracket chain honoured by [`decompose`]; further segments are ignored.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Ordered mapping of parameter name to value, in first-seen order.
pub type ParameterMap = IndexMap<String, ParameterValue>;

/// Value of a single decomposed parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    /// Name given without `=` (`?flag`). Reads as the empty string.
    Bare,
    /// Scalar value, possibly empty (`name=`)
    Text(String),
    /// Children of a bracketed name (`group[item]=v`)
    Nested(ParameterMap),
}

impl ParameterValue {
    /// Scalar view of the value; `None` for nested values.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Bare => Some(""),
            Self::Text(value) => Some(value),
            Self::Nested(_) => None,
        }
    }

    /// Nested children, if any.
    #[must_use]
    pub fn as_nested(&self) -> Option<&ParameterMap> {
        match self {
            Self::Nested(children) => Some(children),
            Self::Bare | Self::Text(_) => None,
        }
    }

    /// A leaf whose value is the empty string. Nested values are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_text().is_some_and(str::is_empty)
    }

    /// Whether the value carries bracketed children
    #[must_use]
    pub fn is_nested(&self) -> bool {
        matches!(self, Self::Nested(_))
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ParameterMap> for ParameterValue {
    fn from(children: ParameterMap) -> Self {
        Self::Nested(children)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bare => Ok(()),
            Self::Text(value) => f.write_str(value),
            Self::Nested(children) => {
                f.write_str("{")?;
                for (i, (key, value)) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Decompose a raw query string into a [`ParameterMap`].
///
/// - a leading `?` is ignored and empty tokens are skipped
/// - only the first `=` separates name from value; a bare name yields
///   [`ParameterValue::Bare`]
/// - names and values are percent-decoded (`+` stays literal); invalid
///   escapes are kept verbatim and invalid UTF-8 is replaced lossily
/// - `a[b][c]=v` nests as `a -> b -> c -> v`, `a[]` appends one past the
///   largest integer key of that level; once `u64::MAX` is taken further
///   appends are dropped
/// - a repeated name overwrites the earlier value but keeps its position
#[must_use]
pub fn decompose(raw: &str) -> ParameterMap {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let mut root = Branch::new();

    for token in raw.split('&').filter(|token| !token.is_empty()) {
        let (name, value) = match token.split_once('=') {
            Some((name, value)) => (decode(name), ParameterValue::Text(decode(value).into_owned())),
            None => (decode(token), ParameterValue::Bare),
        };

        if name.is_empty() {
            tracing::trace!(token, "Skipping parameter without a name");
            continue;
        }

        let (base, segments) = split_name(&name);
        root.insert(base.to_string(), &segments, value);
    }

    let map = root.into_map();
    tracing::trace!(parameters = map.len(), "Decomposed query string");
    map
}

/// Flatten a map back into `(name, value)` pairs using bracket notation.
///
/// Used for display; the pairs are in map order, not sorted.
#[must_use]
pub fn flatten(map: &ParameterMap) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in map {
        flatten_into(key.clone(), value, &mut pairs);
    }
    pairs
}

fn flatten_into(name: String, value: &ParameterValue, pairs: &mut Vec<(String, String)>) {
    match value {
        ParameterValue::Nested(children) => {
            for (key, child) in children {
                flatten_into(format!("{name}[{key}]"), child, pairs);
            }
        }
        ParameterValue::Bare | ParameterValue::Text(_) => {
            pairs.push((name, value.as_text().unwrap_or_default().to_string()));
        }
    }
}

fn decode(input: &str) -> Cow<'_, str> {
    percent_decode_str(input).decode_utf8_lossy()
}

/// Split `base[seg1][seg2]` into its base name and bracket segments.
///
/// Names starting with `[` or whose first bracket never closes are returned
/// whole with no segments. Anything after the last well-formed `]` is dropped.
fn split_name(name: &str) -> (&str, Vec<&str>) {
    let Some(open) = name.find('[') else {
        return (name, Vec::new());
    };
    if open == 0 {
        return (name, Vec::new());
    }

    let (base, mut rest) = name.split_at(open);
    let mut segments = Vec::new();
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            break;
        };
        if segments.len() == MAX_NESTING_DEPTH {
            break;
        }
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }

    if segments.is_empty() {
        return (name, Vec::new());
    }
    (base, segments)
}

/// Map under construction, remembering the next `[]` index of its level.
struct Branch {
    children: IndexMap<String, Node>,
    /// `None` once index `u64::MAX` is taken
    next_index: Option<u64>,
}

enum Node {
    Leaf(ParameterValue),
    Branch(Branch),
}

impl Branch {
    fn new() -> Self {
        Self {
            children: IndexMap::new(),
            next_index: Some(0),
        }
    }

    fn insert(&mut self, key: String, segments: &[&str], value: ParameterValue) {
        self.track_index(&key);

        let Some((segment, rest)) = segments.split_first() else {
            self.children.insert(key, Node::Leaf(value));
            return;
        };

        let slot = self
            .children
            .entry(key)
            .or_insert_with(|| Node::Branch(Self::new()));
        if matches!(slot, Node::Leaf(_)) {
            // A scalar followed by `name[child]` is replaced by the nested form
            *slot = Node::Branch(Self::new());
        }
        if let Node::Branch(branch) = slot {
            let child_key = if segment.is_empty() {
                let Some(index) = branch.next_index else {
                    tracing::trace!("Dropping append past the largest index");
                    return;
                };
                index.to_string()
            } else {
                (*segment).to_string()
            };
            branch.insert(child_key, rest, value);
        }
    }

    /// Keep `next_index` one past the largest integer key seen so far.
    fn track_index(&mut self, key: &str) {
        if let Some(index) = array_index(key) {
            self.next_index = self
                .next_index
                .and_then(|next| index.checked_add(1).map(|after| next.max(after)));
        }
    }

    fn into_map(self) -> ParameterMap {
        self.children
            .into_iter()
            .map(|(key, node)| {
                let value = match node {
                    Node::Leaf(value) => value,
                    Node::Branch(branch) => ParameterValue::Nested(branch.into_map()),
                };
                (key, value)
            })
            .collect()
    }
}

/// Integer keys in canonical decimal form (`"7"`, not `"07"` or `"+7"`).
fn array_index(key: &str) -> Option<u64> {
    let canonical = !key.is_empty()
        && key.bytes().all(|b| b.is_ascii_digit())
        && (key == "0" || !key.starts_with('0'));
    if canonical { key.parse().ok() } else { None }
}
