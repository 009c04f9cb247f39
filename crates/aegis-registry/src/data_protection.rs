//! Data-protection key persistence.
//!
//! Keys live in the data-protection store and are scoped to a shared
//! application name so that cooperating processes (this host and its
//! companion admin application) can decrypt each other's protected
//! payloads.

use std::sync::Arc;

use serde::Deserialize;

use crate::health::CheckStatus;
use crate::persistence::DataProtectionStore;

/// Well-known section key for [`DataProtectionConfiguration`].
pub const DATA_PROTECTION_SECTION: &str = "data_protection";

/// Data-protection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataProtectionConfiguration {
    /// Application name shared between cooperating processes.
    pub application_name: String,
}

impl Default for DataProtectionConfiguration {
    fn default() -> Self {
        Self {
            application_name: "aegis".to_string(),
        }
    }
}

/// The registered keyring handle.
#[derive(Debug)]
pub struct DataProtectionKeyring {
    store: Arc<DataProtectionStore>,
    application_name: String,
}

impl DataProtectionKeyring {
    /// Creates the keyring over its store.
    #[must_use]
    pub fn new(store: Arc<DataProtectionStore>, application_name: impl Into<String>) -> Self {
        Self {
            store,
            application_name: application_name.into(),
        }
    }

    /// The shared application name the keys are scoped to.
    #[must_use]
    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// Readiness probe, delegated to the backing store.
    #[must_use]
    pub fn probe(&self) -> CheckStatus {
        self.store.probe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::StoreBackend;

    #[test]
    fn test_default_application_name() {
        let config = DataProtectionConfiguration::default();
        assert_eq!(config.application_name, "aegis");
    }

    #[test]
    fn test_keyring_scoping() {
        let store = Arc::new(DataProtectionStore::new(StoreBackend::InMemory));
        let keyring = DataProtectionKeyring::new(store, "shared-idp");
        assert_eq!(keyring.application_name(), "shared-idp");
        assert!(keyring.probe().is_healthy());
    }
}
