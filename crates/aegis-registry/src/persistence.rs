//! Persistence store handles and the registration strategy seam.
//!
//! The four stores (identity, protocol configuration, persisted grants,
//! data protection) are opaque external collaborators: the host only
//! needs them registerable, probeable, and addressable by type. The real
//! drivers and transaction discipline live outside this process.
//!
//! [`PersistenceRegistrationStrategy`] is the ONLY designed seam for
//! alternate environments: a hosting entry point injects the production
//! strategy or the staging one without touching any other registration
//! step.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Deserialize;

use aegis_config::ConfigSource;

use crate::auth::Subject;
use crate::container::ServiceContainer;
use crate::error::RegistryError;
use crate::health::CheckStatus;

/// Well-known section key for connection strings.
pub const CONNECTION_STRINGS_SECTION: &str = "connection_strings";

/// Connection strings for the SQL-backed stores.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionStrings {
    /// Administrative identity data.
    pub identity: String,
    /// Protocol/client configuration.
    pub configuration: String,
    /// Persisted grants.
    pub grants: String,
    /// Data-protection keys.
    pub data_protection: String,
}

/// The backend a store handle points at.
#[derive(Debug)]
pub enum StoreBackend {
    /// An external SQL database addressed by connection string.
    Sql {
        /// The connection string, validated non-blank at registration.
        connection_string: String,
    },
    /// A process-local store for staging and tests.
    InMemory,
}

impl StoreBackend {
    fn probe(&self, name: &'static str) -> CheckStatus {
        match self {
            Self::Sql { connection_string } if connection_string.trim().is_empty() => {
                CheckStatus::unhealthy(format!("{name}: connection string is blank"))
            }
            Self::Sql { .. } | Self::InMemory => CheckStatus::Healthy,
        }
    }
}

/// Store for administrative identity data.
#[derive(Debug)]
pub struct IdentityStore {
    backend: StoreBackend,
    /// Session map, populated only for the in-memory backend; the SQL
    /// backend resolves sessions through its external driver.
    sessions: RwLock<HashMap<String, Subject>>,
}

impl IdentityStore {
    /// Creates an identity store over the given backend.
    #[must_use]
    pub fn new(backend: StoreBackend) -> Self {
        Self {
            backend,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Resolves a session token to its subject, if known to this process.
    #[must_use]
    pub fn resolve_session(&self, token: &str) -> Option<Subject> {
        self.sessions
            .read()
            .ok()
            .and_then(|sessions| sessions.get(token).cloned())
    }

    /// Seeds a session, used by the in-memory backend in staging/tests.
    pub fn insert_session(&self, token: impl Into<String>, subject: Subject) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(token.into(), subject);
        }
    }

    /// Readiness probe for health reporting.
    #[must_use]
    pub fn probe(&self) -> CheckStatus {
        self.backend.probe("identity")
    }
}

/// Store for protocol/client configuration records.
#[derive(Debug)]
pub struct ConfigurationStore {
    backend: StoreBackend,
}

impl ConfigurationStore {
    /// Creates a configuration store over the given backend.
    #[must_use]
    pub fn new(backend: StoreBackend) -> Self {
        Self { backend }
    }

    /// Readiness probe for health reporting.
    #[must_use]
    pub fn probe(&self) -> CheckStatus {
        self.backend.probe("configuration")
    }
}

/// Store for persisted grants.
#[derive(Debug)]
pub struct GrantStore {
    backend: StoreBackend,
}

impl GrantStore {
    /// Creates a grant store over the given backend.
    #[must_use]
    pub fn new(backend: StoreBackend) -> Self {
        Self { backend }
    }

    /// Readiness probe for health reporting.
    #[must_use]
    pub fn probe(&self) -> CheckStatus {
        self.backend.probe("grants")
    }
}

/// Store for data-protection keys.
#[derive(Debug)]
pub struct DataProtectionStore {
    backend: StoreBackend,
}

impl DataProtectionStore {
    /// Creates a data-protection store over the given backend.
    #[must_use]
    pub fn new(backend: StoreBackend) -> Self {
        Self { backend }
    }

    /// Readiness probe for health reporting.
    #[must_use]
    pub fn probe(&self) -> CheckStatus {
        self.backend.probe("data_protection")
    }
}

/// Strategy for registering the persistence contexts.
///
/// This is the registrar's single override point: substituting a strategy
/// swaps the persistence backend without altering any other registration
/// step.
pub trait PersistenceRegistrationStrategy: Send + Sync {
    /// Registers the four store handles into the container.
    ///
    /// # Errors
    ///
    /// Any failure is fatal to startup.
    fn register(
        &self,
        container: &mut ServiceContainer,
        source: &ConfigSource,
    ) -> Result<(), RegistryError>;
}

/// Production strategy: SQL-backed stores addressed by connection string.
#[derive(Debug, Default)]
pub struct SqlPersistence;

impl SqlPersistence {
    fn require(value: &str, store: &'static str) -> Result<String, RegistryError> {
        if value.trim().is_empty() {
            Err(RegistryError::missing_connection_string(store))
        } else {
            Ok(value.to_string())
        }
    }
}

impl PersistenceRegistrationStrategy for SqlPersistence {
    fn register(
        &self,
        container: &mut ServiceContainer,
        source: &ConfigSource,
    ) -> Result<(), RegistryError> {
        let strings: ConnectionStrings = source.section(CONNECTION_STRINGS_SECTION)?;

        container.register(std::sync::Arc::new(IdentityStore::new(StoreBackend::Sql {
            connection_string: Self::require(&strings.identity, "identity")?,
        })));
        container.register(std::sync::Arc::new(ConfigurationStore::new(
            StoreBackend::Sql {
                connection_string: Self::require(&strings.configuration, "configuration")?,
            },
        )));
        container.register(std::sync::Arc::new(GrantStore::new(StoreBackend::Sql {
            connection_string: Self::require(&strings.grants, "grants")?,
        })));
        container.register(std::sync::Arc::new(DataProtectionStore::new(
            StoreBackend::Sql {
                connection_string: Self::require(&strings.data_protection, "data_protection")?,
            },
        )));

        tracing::info!("registered SQL persistence stores");
        Ok(())
    }
}

/// Staging strategy: in-memory stores, no connection configuration.
#[derive(Debug, Default)]
pub struct StagingPersistence;

impl PersistenceRegistrationStrategy for StagingPersistence {
    fn register(
        &self,
        container: &mut ServiceContainer,
        _source: &ConfigSource,
    ) -> Result<(), RegistryError> {
        container.register(std::sync::Arc::new(IdentityStore::new(StoreBackend::InMemory)));
        container.register(std::sync::Arc::new(ConfigurationStore::new(
            StoreBackend::InMemory,
        )));
        container.register(std::sync::Arc::new(GrantStore::new(StoreBackend::InMemory)));
        container.register(std::sync::Arc::new(DataProtectionStore::new(
            StoreBackend::InMemory,
        )));

        tracing::info!("registered in-memory persistence stores");
        Ok(())
    }
}
