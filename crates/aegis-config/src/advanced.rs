//! Advanced networking configuration and host environment.
//!
//! [`AdvancedConfiguration`] is read directly from its own section; it is
//! deliberately not part of [`crate::RootConfiguration`]. Its docker
//! location pair decides whether the redirect-rewrite stage is inserted
//! into the pipeline at all.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::source::ConfigSource;

/// Well-known section key for [`AdvancedConfiguration`].
pub const ADVANCED_SECTION: &str = "advanced";

/// Optional reverse-proxy and issuer settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdvancedConfiguration {
    /// Externally advertised identity-provider origin.
    pub issuer_uri: String,
    /// URL prefix as seen inside the container network.
    pub docker_inner_location: String,
    /// URL prefix as seen by external clients.
    pub docker_outer_location: String,
}

impl AdvancedConfiguration {
    /// Binds the advanced section, defaulting everything when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Binding`] when the section is present but
    /// wrongly shaped.
    pub fn bind(source: &ConfigSource) -> Result<Self, ConfigError> {
        source.section(ADVANCED_SECTION)
    }

    /// Whether the redirect-rewrite stage should be active.
    ///
    /// True only when BOTH docker locations are present and non-blank;
    /// whitespace-only values count as blank.
    #[must_use]
    pub fn rewrite_active(&self) -> bool {
        !self.docker_inner_location.trim().is_empty()
            && !self.docker_outer_location.trim().is_empty()
    }
}

/// The hosting environment the process runs in.
///
/// Drives the error-boundary branch of the pipeline (verbose diagnostics
/// versus HSTS enforcement) and the logging format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostEnvironment {
    /// Local development: verbose error pages, human-readable logs.
    Development,
    /// Staging: production pipeline shape, in-memory persistence.
    Staging,
    /// Production (the default when unspecified).
    #[default]
    Production,
}

impl HostEnvironment {
    /// Reads the environment from the `environment` top-level value.
    ///
    /// Unknown or absent values fall back to `Production`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the key is present but
    /// not a string.
    pub fn bind(source: &ConfigSource) -> Result<Self, ConfigError> {
        Ok(source
            .value("environment")?
            .map(|v| Self::parse(&v))
            .unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            "staging" => Self::Staging,
            _ => Self::Production,
        }
    }

    /// Whether this is the development environment.
    #[must_use]
    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}
