//! Core error types for morphbus operations.
//!
//! All errors are explicit, typed, and surface synchronously to the immediate
//! caller. There is no retry and no isolation between handlers or conversion
//! steps: the first failure aborts the rest of the call.

use std::fmt::Display;

use thiserror::Error;

/// Boxed error returned by user supplied handlers and conversions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The standard Result type for morphbus operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for morphbus operations.
#[derive(Debug, Error)]
pub enum Error {
    // Registration errors
    #[error("invalid handler: {reason}")]
    InvalidHandler { reason: String },

    #[error("a transmogrifier for {from} -> {to} is already registered")]
    DuplicateEdge { from: String, to: String },

    // Identification errors
    #[error("unresolved name '{name}'")]
    UnresolvedName { name: String },

    #[error("invalid prototype: {reason}")]
    InvalidPrototype { reason: String },

    // Conversion errors
    #[error("no transmogrification path from {from} to {to}")]
    NoPathFound { from: String, to: String },

    #[error("transmogrifier {from} -> {to} returned an empty result")]
    EmptyResult { from: String, to: String },

    #[error("transmogrifier {from} -> {to} returned a result tagged {actual}")]
    ResultMismatch {
        from: String,
        to: String,
        actual: String,
    },

    #[error("transmogrifier {from} -> {to} failed: {source}")]
    ConversionFailed {
        from: String,
        to: String,
        #[source]
        source: BoxError,
    },

    // Dispatch errors
    #[error("handler for {tag} failed: {source}")]
    HandlerFailed {
        tag: String,
        #[source]
        source: BoxError,
    },

    // Configuration errors
    #[error("configuration error: {reason}")]
    Config { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid handler error.
    pub fn invalid_handler(reason: impl Into<String>) -> Self {
        Self::InvalidHandler {
            reason: reason.into(),
        }
    }

    /// Create a duplicate edge error.
    pub fn duplicate_edge(from: impl Display, to: impl Display) -> Self {
        Self::DuplicateEdge {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Create an unresolved name error.
    pub fn unresolved_name(name: impl Into<String>) -> Self {
        Self::UnresolvedName { name: name.into() }
    }

    /// Create an invalid prototype error.
    pub fn invalid_prototype(reason: impl Into<String>) -> Self {
        Self::InvalidPrototype {
            reason: reason.into(),
        }
    }

    /// Create a no path found error.
    pub fn no_path_found(from: impl Display, to: impl Display) -> Self {
        Self::NoPathFound {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Create an empty result error.
    pub fn empty_result(from: impl Display, to: impl Display) -> Self {
        Self::EmptyResult {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Create a result mismatch error.
    pub fn result_mismatch(from: impl Display, to: impl Display, actual: impl Display) -> Self {
        Self::ResultMismatch {
            from: from.to_string(),
            to: to.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Wrap a failure raised by a conversion function.
    pub fn conversion_failed(from: impl Display, to: impl Display, source: BoxError) -> Self {
        Self::ConversionFailed {
            from: from.to_string(),
            to: to.to_string(),
            source,
        }
    }

    /// Wrap a failure raised by an event handler.
    pub fn handler_failed(tag: impl Display, source: BoxError) -> Self {
        Self::HandlerFailed {
            tag: tag.to_string(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Whether this error reports a conversion step that broke its contract.
    ///
    /// These are the failures the composition layer may choose to swallow.
    #[must_use]
    pub const fn is_verification_failure(&self) -> bool {
        matches!(self, Self::EmptyResult { .. } | Self::ResultMismatch { .. })
    }
}
