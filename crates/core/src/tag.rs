//! Canonical type identifiers.
//!
//! A [`Tag`] is either the exact, fully qualified name of a type or a
//! structural [`Prototype`]. Prototypes compare structurally: two prototypes
//! built from equal JSON mappings are the same tag, whatever their key order.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A structural pattern over JSON mappings.
///
/// A `null` field is a wildcard: the key must exist in a matching value but
/// its content is not inspected. Nested objects are nested prototypes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prototype(Map<String, Value>);

impl Prototype {
    /// Build a prototype from a JSON value, which must be an object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrototype`] for any non-object value.
    pub fn new(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::invalid_prototype(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Build a prototype from an existing mapping.
    #[must_use]
    pub const fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// The fields of this prototype.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the prototype, returning its mapping.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Number of top-level fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the prototype has no fields (and so matches every mapping).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Value> for Prototype {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::new(value)
    }
}

impl Hash for Prototype {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_map(&self.0, state);
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

// Keys are visited in sorted order so hashing agrees with `Map` equality
// whichever map backend serde_json was built with.
fn hash_map<H: Hasher>(map: &Map<String, Value>, state: &mut H) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    state.write_usize(keys.len());
    for key in keys {
        key.hash(state);
        if let Some(value) = map.get(key) {
            hash_value(value, state);
        }
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        Value::Null => {}
        Value::Bool(b) => b.hash(state),
        Value::Number(n) => n.to_string().hash(state),
        Value::String(s) => s.hash(state),
        Value::Array(items) => {
            state.write_usize(items.len());
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(map) => hash_map(map, state),
    }
}

pub(crate) const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Canonical identifier for a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Fully qualified type name, e.g. `app::events::UserCreated`.
    Exact(String),
    /// Structural pattern.
    Prototype(Prototype),
}

impl Tag {
    /// Create an exact tag.
    pub fn exact(name: impl Into<String>) -> Self {
        Self::Exact(name.into())
    }

    /// The exact name, if this is an exact tag.
    #[must_use]
    pub fn as_exact(&self) -> Option<&str> {
        match self {
            Self::Exact(name) => Some(name),
            Self::Prototype(_) => None,
        }
    }

    /// The prototype, if this is a structural tag.
    #[must_use]
    pub const fn as_prototype(&self) -> Option<&Prototype> {
        match self {
            Self::Exact(_) => None,
            Self::Prototype(prototype) => Some(prototype),
        }
    }

    /// Whether this is a structural tag.
    #[must_use]
    pub const fn is_prototype(&self) -> bool {
        matches!(self, Self::Prototype(_))
    }
}

impl From<Prototype> for Tag {
    fn from(prototype: Prototype) -> Self {
        Self::Prototype(prototype)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(name) => f.write_str(name),
            Self::Prototype(prototype) => fmt::Display::fmt(prototype, f),
        }
    }
}
