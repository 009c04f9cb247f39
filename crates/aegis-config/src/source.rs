//! Configuration source with named-section binding.
//!
//! A [`ConfigSource`] is loaded once at startup from a TOML or JSON file
//! (the format is chosen by file extension) and exposes sections
//! addressable by well-known keys. Binding is tolerant: an absent section
//! binds to the section type's defaults; only a present section of the
//! wrong shape is an error.
//!
//! # Example
//!
//! ```
//! use aegis_config::{ConfigSource, RegisterConfiguration};
//!
//! let source = ConfigSource::from_str(
//!     r#"
//!     base_path = "/identity"
//!
//!     [register]
//!     enabled = false
//!     "#,
//!     aegis_config::SourceFormat::Toml,
//! ).unwrap();
//!
//! let register: RegisterConfiguration = source.section("register").unwrap();
//! assert!(!register.enabled);
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ConfigError;

/// Environment variable prefix for scalar overrides.
pub const ENV_PREFIX: &str = "AEGIS_";

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// TOML configuration file.
    Toml,
    /// JSON configuration file.
    Json,
}

/// An immutable configuration source exposing named sections.
///
/// The source is constructed once at process start and shared read-only
/// for the life of the process. Scalar values can be overridden through
/// `AEGIS_*` environment variables before any binding takes place.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// The parsed configuration tree.
    tree: Value,
    /// Scalar overrides applied on top of the tree.
    overrides: HashMap<String, String>,
}

impl ConfigSource {
    /// Creates an empty configuration source.
    ///
    /// Every section binds to its defaults; every value reads as absent.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tree: Value::Object(serde_json::Map::new()),
            overrides: HashMap::new(),
        }
    }

    /// Loads a configuration source from a file.
    ///
    /// Supports TOML (`.toml`) and JSON (`.json`); the format is chosen
    /// by the file extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file does not exist, cannot be read,
    /// has an unsupported extension, or contains invalid TOML/JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        let format = match extension {
            "toml" => SourceFormat::Toml,
            "json" => SourceFormat::Json,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    extension: extension.to_string(),
                })
            }
        };

        Self::from_str(&content, format)
    }

    /// Parses a configuration source from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the content is not valid for the format.
    pub fn from_str(content: &str, format: SourceFormat) -> Result<Self, ConfigError> {
        let tree = match format {
            SourceFormat::Toml => {
                let toml_value: toml::Value = toml::from_str(content)?;
                // Route through serde_json so section binding is format-agnostic.
                serde_json::to_value(toml_value)?
            }
            SourceFormat::Json => serde_json::from_str(content)?,
        };

        Ok(Self {
            tree,
            overrides: HashMap::new(),
        })
    }

    /// Applies `AEGIS_*` environment variable overrides for scalar values.
    ///
    /// `AEGIS_BASE_PATH` overrides `base_path`, `AEGIS_HTTP_ADDR`
    /// overrides `http_addr`, and so on. Overrides take precedence over
    /// the file tree for [`Self::value`] lookups.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        for (var, value) in env::vars() {
            if let Some(key) = var.strip_prefix(ENV_PREFIX) {
                self.overrides.insert(key.to_lowercase(), value);
            }
        }
        self
    }

    /// Sets a single scalar override, mostly useful in tests.
    #[must_use]
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// Binds a named section to a typed configuration shape.
    ///
    /// An absent section yields `T::default()`. Unset fields within a
    /// present section take their defaults through `#[serde(default)]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Binding`] only when the section is present
    /// but cannot be coerced to `T` (wrong shape or type mismatch).
    pub fn section<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Default,
    {
        match self.tree.get(key) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(section) => serde_json::from_value(section.clone())
                .map_err(|e| ConfigError::binding(key, e.to_string())),
        }
    }

    /// Reads an optional top-level string value.
    ///
    /// Environment overrides win over the file tree. Returns `None` when
    /// the key is absent in both.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the key is present in
    /// the file tree but not a string.
    pub fn value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        if let Some(v) = self.overrides.get(key) {
            return Ok(Some(v.clone()));
        }

        match self.tree.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(ConfigError::invalid_value(
                key,
                format!("expected string, found {other}"),
            )),
        }
    }

    /// Reads a top-level string value with a default.
    ///
    /// # Errors
    ///
    /// Same as [`Self::value`].
    pub fn value_or(&self, key: &str, default: &str) -> Result<String, ConfigError> {
        Ok(self.value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// Returns whether a section is present in the source.
    #[must_use]
    pub fn has_section(&self, key: &str) -> bool {
        matches!(self.tree.get(key), Some(v) if !v.is_null())
    }
}
