//! Capability registrar.
//!
//! Translates the bound configuration into the fixed set of active
//! service capabilities, before any request is processed. Registration
//! runs exactly once at startup; the order below matters because later
//! steps resolve what earlier steps registered, and any failure is fatal.
//! A process never starts serving with a partially registered set.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use aegis_config::{ConfigSource, RootConfiguration};
//! use aegis_registry::{
//!     CapabilityRegistrar, ServiceContainer, StagingPersistence, StandardRole, StandardUser,
//! };
//!
//! # fn main() -> Result<(), aegis_registry::RegistryError> {
//! let source = ConfigSource::empty();
//! let root = Arc::new(RootConfiguration::bind(&source)?);
//!
//! let mut container = ServiceContainer::new();
//! CapabilityRegistrar::new(source, root)
//!     .register_all::<StandardUser, StandardRole>(&mut container, &StagingPersistence)?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use aegis_config::{AdvancedConfiguration, ConfigSource, RootConfiguration};

use crate::auth::{AuthenticationService, IdentityShape, TokenIssuer};
use crate::authorization::AuthorizationPolicies;
use crate::container::ServiceContainer;
use crate::data_protection::{
    DataProtectionConfiguration, DataProtectionKeyring, DATA_PROTECTION_SECTION,
};
use crate::email::{
    ApiEmailSender, Email, EmailConfiguration, EmailSender, LogEmailSender, SmtpEmailSender,
    EMAIL_SECTION,
};
use crate::error::RegistryError;
use crate::health::HealthRegistry;
use crate::hsts::HstsPolicy;
use crate::localization::{Localization, LocalizationConfiguration, LOCALIZATION_SECTION};
use crate::persistence::{
    ConfigurationStore, DataProtectionStore, GrantStore, IdentityStore,
    PersistenceRegistrationStrategy,
};

/// Registers the capability set against a [`ServiceContainer`].
///
/// The persistence step is delegated to an injected
/// [`PersistenceRegistrationStrategy`]; everything else is fixed.
#[derive(Debug)]
pub struct CapabilityRegistrar {
    source: ConfigSource,
    root: Arc<RootConfiguration>,
}

impl CapabilityRegistrar {
    /// Creates a registrar over the bound configuration.
    #[must_use]
    pub fn new(source: ConfigSource, root: Arc<RootConfiguration>) -> Self {
        Self { source, root }
    }

    /// Runs every registration step in order.
    ///
    /// # Errors
    ///
    /// Any step failing is fatal to startup; the container must be
    /// discarded, never served from.
    pub fn register_all<U: IdentityShape, R: IdentityShape>(
        &self,
        container: &mut ServiceContainer,
        persistence: &dyn PersistenceRegistrationStrategy,
    ) -> Result<(), RegistryError> {
        self.register_root_configuration(container);
        persistence.register(container, &self.source)?;
        self.register_data_protection(container)?;
        self.register_email_senders(container)?;
        self.register_authentication::<U, R>(container)?;
        self.register_hsts(container);
        self.register_localization::<U, R>(container)?;
        self.register_authorization(container);
        self.register_health_checks(container)?;

        tracing::info!(services = container.len(), "capability set registered");
        Ok(())
    }

    /// Step 1: the root configuration as shared, read-only state.
    pub fn register_root_configuration(&self, container: &mut ServiceContainer) {
        container.register(Arc::clone(&self.root));
    }

    /// Step 3: data-protection keys, scoped to the shared application
    /// name so cooperating processes can decrypt each other's payloads.
    pub fn register_data_protection(
        &self,
        container: &mut ServiceContainer,
    ) -> Result<(), RegistryError> {
        let config: DataProtectionConfiguration =
            self.source.section(DATA_PROTECTION_SECTION)?;
        let store = container.expect::<DataProtectionStore>()?;

        container.register(Arc::new(DataProtectionKeyring::new(
            store,
            config.application_name,
        )));
        Ok(())
    }

    /// Step 4: the outbound email transport selected by configuration.
    pub fn register_email_senders(
        &self,
        container: &mut ServiceContainer,
    ) -> Result<(), RegistryError> {
        let config: EmailConfiguration = self.source.section(EMAIL_SECTION)?;

        let sender: Arc<dyn EmailSender> = match config.provider.as_str() {
            "log" => Arc::new(LogEmailSender),
            "smtp" => {
                if config.smtp.host.trim().is_empty() {
                    return Err(RegistryError::invalid_capability(
                        "email provider `smtp` requires smtp.host",
                    ));
                }
                Arc::new(SmtpEmailSender::new(&config.smtp, config.from.clone()))
            }
            "api" => {
                if config.api.endpoint.trim().is_empty() {
                    return Err(RegistryError::invalid_capability(
                        "email provider `api` requires api.endpoint",
                    ));
                }
                Arc::new(ApiEmailSender::new(&config.api, config.from.clone()))
            }
            other => {
                return Err(RegistryError::invalid_capability(format!(
                    "unknown email provider `{other}`"
                )))
            }
        };

        tracing::debug!(provider = sender.name(), "email transport selected");
        container.register(Arc::new(Email::new(sender)));
        Ok(())
    }

    /// Step 5: authentication bound to the user/role shape, plus token
    /// issuance bound to the configuration and grant stores.
    pub fn register_authentication<U: IdentityShape, R: IdentityShape>(
        &self,
        container: &mut ServiceContainer,
    ) -> Result<(), RegistryError> {
        let identity_store = container.expect::<IdentityStore>()?;
        let configuration_store = container.expect::<ConfigurationStore>()?;
        let grant_store = container.expect::<GrantStore>()?;

        container.register(Arc::new(AuthenticationService::bound::<U, R>(
            identity_store,
        )));

        let advanced = AdvancedConfiguration::bind(&self.source)?;
        container.register(Arc::new(TokenIssuer::<U>::new(
            configuration_store,
            grant_store,
            advanced.issuer_uri,
        )));
        Ok(())
    }

    /// Step 6: the fixed HSTS policy.
    pub fn register_hsts(&self, container: &mut ServiceContainer) {
        container.register(Arc::new(HstsPolicy::fixed()));
    }

    /// Step 7: localization wiring, same shape as the authentication
    /// step.
    pub fn register_localization<U: IdentityShape, R: IdentityShape>(
        &self,
        container: &mut ServiceContainer,
    ) -> Result<(), RegistryError> {
        let config: LocalizationConfiguration = self.source.section(LOCALIZATION_SECTION)?;
        container.register(Arc::new(Localization::bound::<U, R>(&config)));
        Ok(())
    }

    /// Step 8: authorization policies derived from the root
    /// configuration.
    pub fn register_authorization(&self, container: &mut ServiceContainer) {
        container.register(Arc::new(AuthorizationPolicies::from_root(&self.root)));
    }

    /// Step 9: health checks across every store and the keyring.
    pub fn register_health_checks(
        &self,
        container: &mut ServiceContainer,
    ) -> Result<(), RegistryError> {
        let identity = container.expect::<IdentityStore>()?;
        let configuration = container.expect::<ConfigurationStore>()?;
        let grants = container.expect::<GrantStore>()?;
        let data_protection = container.expect::<DataProtectionStore>()?;
        let keyring = container.expect::<DataProtectionKeyring>()?;

        let registry = HealthRegistry::new()
            .add_check("identity", move || identity.probe())
            .add_check("configuration", move || configuration.probe())
            .add_check("grants", move || grants.probe())
            .add_check("data_protection", move || data_protection.probe())
            .add_check("keyring", move || keyring.probe());

        container.register(Arc::new(registry));
        Ok(())
    }
}
