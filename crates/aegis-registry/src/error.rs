//! Registration error types.
//!
//! Every error in this crate is a startup error: registration runs once,
//! before any request is accepted, and any failure is fatal. There are no
//! retries; configuration mistakes are operator errors surfaced at boot.

use thiserror::Error;

/// Errors raised while registering the capability set.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A required connection string is missing or blank.
    #[error("missing connection string for `{store}`")]
    MissingConnectionString {
        /// The store whose connection string is absent.
        store: &'static str,
    },

    /// A capability was resolved before being registered.
    #[error("service not registered: {type_name}")]
    ServiceNotRegistered {
        /// The Rust type name of the missing service.
        type_name: &'static str,
    },

    /// Invalid capability configuration.
    #[error("invalid capability configuration: {message}")]
    InvalidCapability {
        /// Description of the configuration problem.
        message: String,
    },

    /// Configuration binding failed.
    #[error(transparent)]
    Config(#[from] aegis_config::ConfigError),
}

impl RegistryError {
    /// Creates a missing connection string error.
    #[must_use]
    pub fn missing_connection_string(store: &'static str) -> Self {
        Self::MissingConnectionString { store }
    }

    /// Creates an invalid capability error.
    pub fn invalid_capability(message: impl Into<String>) -> Self {
        Self::InvalidCapability {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_connection_string_display() {
        let err = RegistryError::missing_connection_string("identity");
        assert!(err.to_string().contains("identity"));
    }

    #[test]
    fn test_invalid_capability_display() {
        let err = RegistryError::invalid_capability("email endpoint is not a URL");
        assert!(err.to_string().contains("email endpoint"));
    }
}
