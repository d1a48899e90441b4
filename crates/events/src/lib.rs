//! Synchronous in-process event bus.
//!
//! This crate decouples producers and consumers of events. Key features:
//!
//! - **Exact matching**: typed events reach handlers subscribed to their type
//! - **Structural matching**: JSON events reach every handler whose prototype
//!   they match
//! - **Handler classes**: ordered priority buckets controlling dispatch order
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use morphbus_core::{NameResolver, Payload};
//! use morphbus_events::{handler, EventBus};
//!
//! struct Started;
//!
//! let resolver = NameResolver::new().with_type::<Started>("app::Started");
//! let bus = EventBus::new(Rc::new(resolver));
//!
//! bus.subscribe("app::Started", handler(|_event| Ok(())))?;
//! bus.publish(&Payload::new(Started))?;
//! # Ok::<(), morphbus_core::Error>(())
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod bus;
pub mod handlers;

// Re-export main types
pub use bus::{EventBus, EventBusBuilder};
pub use handlers::{handler, Handler, HandlerClass, HandlerResult};
