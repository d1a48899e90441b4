//! Resolution of human-friendly identifiers to canonical [`Tag`]s.
//!
//! Rust has no runtime constant lookup, so names are resolved through an
//! explicit table built at startup: each Rust type that should be addressable
//! by name is registered under its fully qualified, `::`-separated name.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::matching::matches;
use crate::payload::{Payload, TypeDescriptor};
use crate::tag::{Prototype, Tag};

/// Anything that can name a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    /// A concrete Rust type.
    Type(TypeDescriptor),
    /// A fully qualified name such as `app::events::Created`.
    Name(String),
    /// A snake_case short name such as `created`, looked up in the default
    /// namespace after conversion to CamelCase.
    Symbol(String),
    /// A structural template.
    Prototype(Prototype),
    /// An already canonical tag.
    Tag(Tag),
}

impl Identifier {
    /// Identifier for the Rust type `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self::Type(TypeDescriptor::of::<T>())
    }

    /// Identifier for a fully qualified name.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Identifier for a short name in the default namespace.
    pub fn symbol(symbol: impl Into<String>) -> Self {
        Self::Symbol(symbol.into())
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<TypeDescriptor> for Identifier {
    fn from(descriptor: TypeDescriptor) -> Self {
        Self::Type(descriptor)
    }
}

impl From<Prototype> for Identifier {
    fn from(prototype: Prototype) -> Self {
        Self::Prototype(prototype)
    }
}

impl From<Tag> for Identifier {
    fn from(tag: Tag) -> Self {
        Self::Tag(tag)
    }
}

impl From<&Tag> for Identifier {
    fn from(tag: &Tag) -> Self {
        Self::Tag(tag.clone())
    }
}

/// Registration table mapping names to Rust types and back.
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    names: HashMap<String, TypeDescriptor>,
    types: HashMap<TypeId, String>,
}

impl NameResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `name`, builder style.
    #[must_use]
    pub fn with_type<T: Any>(mut self, name: impl Into<String>) -> Self {
        self.register::<T>(name);
        self
    }

    /// Register `T` under `name`, returning the name it had before, if any.
    ///
    /// A leading `::` is dropped. Re-registering a type renames it.
    pub fn register<T: Any>(&mut self, name: impl Into<String>) -> Option<String> {
        let name = normalize(&name.into()).to_string();
        let descriptor = TypeDescriptor::of::<T>();

        let previous = self.types.insert(descriptor.id(), name.clone());
        if let Some(old) = &previous {
            self.names.remove(old);
        }
        if let Some(displaced) = self.names.insert(name.clone(), descriptor) {
            if displaced.id() != descriptor.id() {
                self.types.remove(&displaced.id());
            }
        }

        debug!(name = %name, rust_type = descriptor.type_name(), "Registered type name");
        previous
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(normalize(name))
    }

    /// Canonical name of a Rust type: its registered name, or the compiler
    /// type name for unregistered types.
    #[must_use]
    pub fn canonical_name(&self, descriptor: TypeDescriptor) -> String {
        self.types
            .get(&descriptor.id())
            .cloned()
            .unwrap_or_else(|| descriptor.type_name().to_string())
    }

    /// Resolve an identifier to its canonical tag.
    ///
    /// Symbols are CamelCased and qualified with `default_namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedName`] for empty or unregistered names.
    pub fn resolve(&self, identifier: &Identifier, default_namespace: &str) -> Result<Tag> {
        match identifier {
            Identifier::Type(descriptor) => Ok(Tag::Exact(self.canonical_name(*descriptor))),
            Identifier::Name(name) => self.lookup(normalize(name)),
            Identifier::Symbol(symbol) => {
                let short = camel_case(symbol);
                if short.is_empty() {
                    return Err(Error::unresolved_name(symbol.clone()));
                }
                self.lookup(&qualify(default_namespace, &short))
            }
            Identifier::Prototype(prototype) => Ok(Tag::Prototype(prototype.clone())),
            Identifier::Tag(tag) => Ok(tag.clone()),
        }
    }

    /// The canonical tag of a payload: its type name, or its own shape.
    #[must_use]
    pub fn tag_of(&self, payload: &Payload) -> Tag {
        match payload {
            Payload::Typed(typed) => Tag::Exact(self.canonical_name(typed.descriptor())),
            Payload::Structural(map) => Tag::Prototype(Prototype::from_map(map.clone())),
        }
    }

    /// Whether `payload` carries `tag`.
    ///
    /// Exact tags require a typed payload with that canonical name; prototype
    /// tags require a structural payload that matches the prototype.
    #[must_use]
    pub fn conforms(&self, payload: &Payload, tag: &Tag) -> bool {
        match (tag, payload) {
            (Tag::Exact(name), Payload::Typed(typed)) => {
                self.canonical_name(typed.descriptor()) == *name
            }
            (Tag::Prototype(prototype), Payload::Structural(map)) => matches(map, prototype),
            _ => false,
        }
    }

    fn lookup(&self, name: &str) -> Result<Tag> {
        if name.is_empty() || !self.names.contains_key(name) {
            return Err(Error::unresolved_name(name));
        }
        Ok(Tag::exact(name))
    }
}

fn normalize(name: &str) -> &str {
    name.strip_prefix("::").unwrap_or(name)
}

fn qualify(namespace: &str, short: &str) -> String {
    let namespace = normalize(namespace).trim_end_matches("::");
    if namespace.is_empty() {
        short.to_string()
    } else {
        format!("{namespace}::{short}")
    }
}

/// Turn an underscored name into CamelCase: `inner_test_event` becomes
/// `InnerTestEvent`.
#[must_use]
pub fn camel_case(underscored: &str) -> String {
    underscored
        .split('_')
        .filter_map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
        })
        .collect()
}
