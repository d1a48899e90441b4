//! Shared primitives for morphbus.
//!
//! - **Tags**: canonical type identifiers, exact names or structural prototypes
//! - **Matching**: scoring of JSON mappings against prototypes
//! - **Payloads**: the values that are published and converted
//! - **Name resolution**: explicit table from names to Rust types
//! - **Config** and **errors** shared by the engine crates

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod error;
pub mod matching;
pub mod payload;
pub mod resolver;
pub mod tag;

pub use config::Config;
pub use error::{BoxError, Error, Result};
pub use matching::{best_match, match_score, matches};
pub use payload::{Payload, TypeDescriptor, TypedValue};
pub use resolver::{camel_case, Identifier, NameResolver};
pub use tag::{Prototype, Tag};
