//! Authorization policies derived from the root configuration.
//!
//! The registration policy only exists while self-registration is
//! enabled; the policy set itself is part of what configuration decides
//! at startup, not just the outcomes.

use aegis_config::RootConfiguration;

use crate::auth::Identity;

/// Name of the administration policy.
pub const ADMINISTRATION_POLICY: &str = "administration";

/// Name of the self-registration policy.
pub const REGISTRATION_POLICY: &str = "registration";

/// The fixed policy set built from [`RootConfiguration`] at startup.
#[derive(Debug, Clone)]
pub struct AuthorizationPolicies {
    administration_role: String,
    registration_enabled: bool,
}

impl AuthorizationPolicies {
    /// Builds the policy set.
    #[must_use]
    pub fn from_root(root: &RootConfiguration) -> Self {
        Self {
            administration_role: root.admin.administration_role.clone(),
            registration_enabled: root.register.enabled,
        }
    }

    /// Whether a policy with the given name exists.
    ///
    /// The registration policy is absent entirely when self-registration
    /// is disabled.
    #[must_use]
    pub fn has_policy(&self, name: &str) -> bool {
        match name {
            ADMINISTRATION_POLICY => true,
            REGISTRATION_POLICY => self.registration_enabled,
            _ => false,
        }
    }

    /// Evaluates a policy against a caller identity.
    ///
    /// Unknown (or absent) policies always deny.
    #[must_use]
    pub fn evaluate(&self, name: &str, identity: &Identity) -> bool {
        match name {
            ADMINISTRATION_POLICY => identity.has_role(&self.administration_role),
            REGISTRATION_POLICY => self.registration_enabled,
            _ => false,
        }
    }

    /// The role the administration policy requires.
    #[must_use]
    pub fn administration_role(&self) -> &str {
        &self.administration_role
    }
}
