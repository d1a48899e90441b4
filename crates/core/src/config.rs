//! Configuration for a morphbus world.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Settings shared by the event bus, the transmogrifier registry and the
/// composition layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Namespace the event bus qualifies symbolic event names with.
    #[serde(default)]
    pub events_namespace: String,

    /// Namespace the transmogrifier registry qualifies symbolic names with.
    #[serde(default)]
    pub transmogrifiers_namespace: String,

    /// Whether auto-transmogrifying handlers propagate empty or mismatched
    /// conversion results instead of dropping them.
    #[serde(default)]
    pub raise_on_empty: bool,
}

impl Config {
    /// Set the event bus namespace.
    #[must_use]
    pub fn with_events_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.events_namespace = namespace.into();
        self
    }

    /// Set the transmogrifier registry namespace.
    #[must_use]
    pub fn with_transmogrifiers_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.transmogrifiers_namespace = namespace.into();
        self
    }

    /// Make auto-transmogrification raise on empty results.
    #[must_use]
    pub const fn raise_on_empty(mut self, raise: bool) -> Self {
        self.raise_on_empty = raise;
        self
    }

    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(namespace) = std::env::var("MORPHBUS_EVENTS_NAMESPACE") {
            config.events_namespace = namespace;
        }

        if let Ok(namespace) = std::env::var("MORPHBUS_TRANSMOGRIFIERS_NAMESPACE") {
            config.transmogrifiers_namespace = namespace;
        }

        if let Ok(raise) = std::env::var("MORPHBUS_RAISE_ON_EMPTY") {
            config.raise_on_empty = parse_flag(&raise);
        }

        config
    }

    /// Load configuration from a file.
    ///
    /// Files ending in `.json` are parsed as JSON, anything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read and
    /// [`Error::Config`] when it cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)
                .map_err(|e| Error::config(format!("Failed to parse config: {e}")))
        } else {
            toml::from_str(&content)
                .map_err(|e| Error::config(format!("Failed to parse config: {e}")))
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
