//! Values that travel over the bus and through conversion chains.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::tag::json_kind;

/// Handle for a concrete Rust type: its `TypeId` and compiler-given name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
}

impl TypeDescriptor {
    /// Descriptor for `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The type's `TypeId`.
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// The compiler-given type name, e.g. `my_app::events::Created`.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.name
    }
}

/// A published event or a value fed into a conversion.
///
/// Typed payloads wrap an arbitrary Rust value and are tagged by their type.
/// Structural payloads are JSON mappings and are tagged by their shape.
/// Cloning is cheap for typed payloads (the value is shared).
#[derive(Clone)]
pub enum Payload {
    /// A concrete Rust value.
    Typed(TypedValue),
    /// A JSON mapping.
    Structural(Map<String, Value>),
}

/// A shared, type-erased Rust value.
#[derive(Clone)]
pub struct TypedValue {
    descriptor: TypeDescriptor,
    value: Rc<dyn Any>,
}

impl TypedValue {
    /// The descriptor of the wrapped value's type.
    #[must_use]
    pub const fn descriptor(&self) -> TypeDescriptor {
        self.descriptor
    }
}

impl Payload {
    /// Wrap a Rust value.
    pub fn new<T: Any>(value: T) -> Self {
        Self::Typed(TypedValue {
            descriptor: TypeDescriptor::of::<T>(),
            value: Rc::new(value),
        })
    }

    /// Wrap a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrototype`] when `value` is not an object.
    pub fn structural(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::Structural(map)),
            other => Err(Error::invalid_prototype(format!(
                "structural payloads must be JSON objects, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Borrow the wrapped Rust value as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Typed(typed) => (*typed.value).downcast_ref::<T>(),
            Self::Structural(_) => None,
        }
    }

    /// Whether this payload wraps a value of type `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.value_type()
            .is_some_and(|descriptor| descriptor.id() == TypeId::of::<T>())
    }

    /// The type of a typed payload.
    #[must_use]
    pub const fn value_type(&self) -> Option<TypeDescriptor> {
        match self {
            Self::Typed(typed) => Some(typed.descriptor),
            Self::Structural(_) => None,
        }
    }

    /// The mapping of a structural payload.
    #[must_use]
    pub const fn as_structure(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Typed(_) => None,
            Self::Structural(map) => Some(map),
        }
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self::Structural(map)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Typed(typed) => f
                .debug_tuple("Typed")
                .field(&typed.descriptor.type_name())
                .finish(),
            Self::Structural(map) => f.debug_tuple("Structural").field(map).finish(),
        }
    }
}
