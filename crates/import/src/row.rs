use std::fmt;

use indexmap::IndexMap;
use rowsync_store::{RecordId, Value};

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// One cell of a row: a raw source string, a typed scalar, or a resolved
/// reference to a related record (produced by key-path resolution).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Raw(String),
    Typed(Value),
    Reference(RecordId),
}

impl FieldValue {
    /// Blank means unusable as a uid value and skipped by required checks:
    /// empty/whitespace raw text, or a blank typed value. A reference is
    /// never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Raw(s) => s.trim().is_empty(),
            Self::Typed(v) => v.is_blank(),
            Self::Reference(_) => false,
        }
    }
}

// Display is used in error messages only.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(s) => write!(f, "{s}"),
            Self::Typed(v) => write!(f, "{v}"),
            Self::Reference(id) => write!(f, "#{id}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Raw(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Raw(s)
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        Self::Typed(v)
    }
}

impl From<RecordId> for FieldValue {
    fn from(id: RecordId) -> Self {
        Self::Reference(id)
    }
}

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// One input item: an insertion-ordered map from field path to value.
/// Keys are canonicalized (trimmed) on entry so there is a single string
/// form downstream; no case folding. A dotted key (`relation.attribute`)
/// denotes an association traversal resolved by the normalizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: IndexMap<String, FieldValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut row = Self::new();
        for (key, value) in pairs {
            row.set(key, value);
        }
        row
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(canonical(&field.into()), value.into());
    }

    /// Insert only when the key is absent. Defaults fill gaps, never
    /// overwrite supplied values.
    pub fn set_if_absent(&mut self, field: &str, value: impl Into<FieldValue>) {
        let key = canonical(field);
        self.fields.entry(key).or_insert_with(|| value.into());
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field.trim())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field.trim())
    }

    /// Remove a field, preserving the order of the rest.
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.shift_remove(field.trim())
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.fields.retain(|key, _| keep(key));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn canonical(field: &str) -> String {
    field.trim().to_string()
}
