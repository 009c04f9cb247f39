//! Root configuration shared across the process.
//!
//! [`RootConfiguration`] aggregates the admin and registration policy
//! sections. It is bound exactly once at startup and then shared by
//! reference (`Arc`) with every consumer for the life of the process;
//! no mutation path exists after construction.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::source::ConfigSource;

/// Well-known section key for [`AdminConfiguration`].
pub const ADMIN_SECTION: &str = "admin";

/// Well-known section key for [`RegisterConfiguration`].
pub const REGISTER_SECTION: &str = "register";

/// Settings consumed by authorization-policy setup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfiguration {
    /// Base URL of the companion administration application.
    pub base_url: String,
    /// Role name required by the administration authorization policy.
    pub administration_role: String,
}

impl Default for AdminConfiguration {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            administration_role: "AegisAdministrator".to_string(),
        }
    }
}

/// Settings governing self-registration policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegisterConfiguration {
    /// Whether self-registration is permitted.
    pub enabled: bool,
}

impl Default for RegisterConfiguration {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Process-wide root configuration, immutable after startup binding.
#[derive(Debug, Clone, Default)]
pub struct RootConfiguration {
    /// Admin settings passed through to authorization setup.
    pub admin: AdminConfiguration,
    /// Registration policy settings.
    pub register: RegisterConfiguration,
}

impl RootConfiguration {
    /// Binds the root configuration from its two well-known sections.
    ///
    /// Binding is total over absent sections: an empty source yields
    /// default-valued sub-configurations.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Binding`] only when a present section
    /// cannot be coerced to its expected shape.
    pub fn bind(source: &ConfigSource) -> Result<Self, ConfigError> {
        Ok(Self {
            admin: source.section(ADMIN_SECTION)?,
            register: source.section(REGISTER_SECTION)?,
        })
    }
}
