#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # morphbus
//!
//! In-process event bus and type conversion graph.
//!
//! This library re-exports the morphbus workspace crates and adds
//! [`World`], a context object combining both engines.

pub use morphbus_core;
pub use morphbus_events;
pub use morphbus_transmogrifiers;

pub mod telemetry;
pub mod world;

pub use morphbus_core::{Config, Error, Identifier, NameResolver, Payload, Prototype, Result, Tag};
pub use morphbus_events::{handler, EventBus, Handler};
pub use morphbus_transmogrifiers::{conversion, Conversion, TransmogrifierRegistry};
pub use world::{AutoTransmogrify, OnEvent, OnTransmogrify, Transmogrify, World};
