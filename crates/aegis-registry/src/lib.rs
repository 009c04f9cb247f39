//! Startup capability registration for the Aegis STS host.
//!
//! This crate turns bound configuration into the fixed set of service
//! capabilities the request pipeline consumes: persistence store
//! handles, data-protection keys, outbound email, authentication and
//! token issuance, the HSTS policy, localization, authorization
//! policies, and health checks.
//!
//! Registration happens exactly once at startup through the
//! [`CapabilityRegistrar`]; every failure is fatal, and the resulting
//! [`ServiceContainer`] is shared read-only across all request tasks.
//!
//! The single designed seam is [`PersistenceRegistrationStrategy`]: a
//! hosting entry point substitutes [`StagingPersistence`] for
//! [`SqlPersistence`] to run against in-memory stores without touching
//! any other registration step.

#![warn(missing_docs)]

mod auth;
mod authorization;
mod container;
mod data_protection;
mod email;
mod error;
mod health;
mod hsts;
mod localization;
mod persistence;
mod registrar;

pub use auth::{
    AuthenticationService, Identity, IdentityShape, StandardRole, StandardUser, Subject,
    TokenIssuer, SESSION_COOKIE,
};
pub use authorization::{
    AuthorizationPolicies, ADMINISTRATION_POLICY, REGISTRATION_POLICY,
};
pub use container::ServiceContainer;
pub use data_protection::{
    DataProtectionConfiguration, DataProtectionKeyring, DATA_PROTECTION_SECTION,
};
pub use email::{
    ApiEmailSender, ApiSettings, BoxFuture, Email, EmailConfiguration, EmailError,
    EmailMessage, EmailSender, LogEmailSender, SmtpEmailSender, SmtpSettings, EMAIL_SECTION,
};
pub use error::RegistryError;
pub use health::{CheckStatus, HealthEntry, HealthRegistry, HealthReport};
pub use hsts::HstsPolicy;
pub use localization::{Localization, LocalizationConfiguration, LOCALIZATION_SECTION};
pub use persistence::{
    ConfigurationStore, ConnectionStrings, DataProtectionStore, GrantStore, IdentityStore,
    PersistenceRegistrationStrategy, SqlPersistence, StagingPersistence, StoreBackend,
    CONNECTION_STRINGS_SECTION,
};
pub use registrar::CapabilityRegistrar;
