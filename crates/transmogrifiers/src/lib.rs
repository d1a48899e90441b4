//! Graph of value conversions ("transmogrifiers").
//!
//! Conversions are registered as directed edges between tags. Converting a
//! value runs the shortest chain of conversions from the value's tag to the
//! requested one, optionally verifying every intermediate result.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use morphbus_core::{Identifier, NameResolver, Payload};
//! use morphbus_transmogrifiers::{conversion, TransmogrifierRegistry};
//!
//! struct Meters(f64);
//! struct Feet(f64);
//!
//! let resolver = NameResolver::new()
//!     .with_type::<Meters>("length::Meters")
//!     .with_type::<Feet>("length::Feet");
//! let registry = TransmogrifierRegistry::new(Rc::new(resolver));
//!
//! registry.register(
//!     "length::Meters",
//!     "length::Feet",
//!     false,
//!     conversion(|value| Ok(value.downcast_ref::<Meters>().map(|m| Payload::new(Feet(m.0 * 3.28084))))),
//! )?;
//!
//! let feet = registry.transmogrify(&Payload::new(Meters(1.0)), Identifier::of::<Feet>())?;
//! assert!(feet.is::<Feet>());
//! # Ok::<(), morphbus_core::Error>(())
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

mod graph;
pub mod registry;

// Re-export main types
pub use graph::{conversion, Conversion, ConversionResult};
pub use registry::{TransmogrifierRegistry, TransmogrifierRegistryBuilder};
