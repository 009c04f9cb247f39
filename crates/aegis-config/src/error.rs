//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and binding.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read configuration file.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format.
    #[error("unsupported configuration format: {extension}")]
    UnsupportedFormat {
        /// The unrecognized file extension.
        extension: String,
    },

    /// A present section could not be coerced to the expected shape.
    ///
    /// Absent sections are never an error; binding them yields the
    /// section type's defaults.
    #[error("failed to bind configuration section `{section}`: {reason}")]
    Binding {
        /// The section that failed to bind.
        section: String,
        /// Why the section could not be coerced.
        reason: String,
    },

    /// A top-level value could not be coerced to the expected type.
    #[error("invalid configuration value for `{key}`: {reason}")]
    InvalidValue {
        /// The key with the invalid value.
        key: String,
        /// Explanation of why the value is invalid.
        reason: String,
    },
}

impl ConfigError {
    /// Create a new file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create a new section binding error.
    pub fn binding(section: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Binding {
            section: section.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid value error.
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
