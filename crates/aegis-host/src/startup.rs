//! Startup wiring.
//!
//! [`Startup`] owns the two one-shot phases of boot: registering the
//! capability set, then building the request pipeline. Both run before
//! the listener opens; any failure in either is fatal and the process
//! never serves a request from a partially wired state.

use std::sync::Arc;

use thiserror::Error;

use aegis_config::{
    AdvancedConfiguration, ConfigError, ConfigSource, HostEnvironment, RootConfiguration,
};
use aegis_pipeline::{Pipeline, PipelineBuilder, DEFAULT_STATIC_ROOT};
use aegis_registry::{
    CapabilityRegistrar, PersistenceRegistrationStrategy, RegistryError, ServiceContainer,
    SqlPersistence, StagingPersistence, StandardRole, StandardUser, TokenIssuer,
};

use crate::controllers;

/// Errors that abort startup.
#[derive(Error, Debug)]
pub enum StartupError {
    /// Configuration loading or binding failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Capability registration failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// One-shot startup wiring for the host process.
#[derive(Debug)]
pub struct Startup {
    source: ConfigSource,
    environment: HostEnvironment,
    root: Arc<RootConfiguration>,
}

impl Startup {
    /// Binds the root configuration and environment from the source.
    ///
    /// # Errors
    ///
    /// Fails on a wrongly shaped section; absent sections bind to
    /// defaults.
    pub fn new(source: ConfigSource) -> Result<Self, StartupError> {
        let environment = HostEnvironment::bind(&source)?;
        let root = Arc::new(RootConfiguration::bind(&source)?);
        Ok(Self {
            source,
            environment,
            root,
        })
    }

    /// The environment this host runs in.
    #[must_use]
    pub fn environment(&self) -> HostEnvironment {
        self.environment
    }

    /// The bound root configuration.
    #[must_use]
    pub fn root(&self) -> &Arc<RootConfiguration> {
        &self.root
    }

    /// Registers the capability set with the strategy matching the
    /// environment: in-memory stores for staging, SQL elsewhere.
    ///
    /// # Errors
    ///
    /// Any registration failure is fatal.
    pub fn configure_services(&self) -> Result<ServiceContainer, StartupError> {
        match self.environment {
            HostEnvironment::Staging => self.configure_services_with(&StagingPersistence),
            _ => self.configure_services_with(&SqlPersistence),
        }
    }

    /// Registers the capability set with an explicit persistence
    /// strategy; the seam test hosts use.
    ///
    /// # Errors
    ///
    /// Any registration failure is fatal.
    pub fn configure_services_with(
        &self,
        persistence: &dyn PersistenceRegistrationStrategy,
    ) -> Result<ServiceContainer, StartupError> {
        let mut container = ServiceContainer::new();
        CapabilityRegistrar::new(self.source.clone(), Arc::clone(&self.root))
            .register_all::<StandardUser, StandardRole>(&mut container, persistence)?;
        Ok(container)
    }

    /// Builds the request pipeline over a registered container.
    ///
    /// # Errors
    ///
    /// Fails when the advanced configuration is wrongly shaped or a
    /// required capability is missing from the container.
    pub fn build_pipeline(&self, container: &ServiceContainer) -> Result<Pipeline, StartupError> {
        let advanced = AdvancedConfiguration::bind(&self.source)?;
        let base_path = self.source.value_or("base_path", "")?;
        let static_root = self.source.value_or("static_root", DEFAULT_STATIC_ROOT)?;

        let issuer = container.expect::<TokenIssuer>()?;

        let pipeline = PipelineBuilder::new(self.environment, advanced)
            .base_path(base_path)
            .static_root(static_root)
            .map_controller("home", "index", controllers::home)
            .map_controller("account", "login", controllers::login(issuer))
            .map_controller("register", "index", controllers::register)
            .build(container)?;

        tracing::info!(stages = ?pipeline.stage_names(), "pipeline assembled");
        Ok(pipeline)
    }

    /// The address the server binds, `http_addr` or the default.
    ///
    /// # Errors
    ///
    /// Fails when the configured value is not a string.
    pub fn http_addr(&self) -> Result<String, StartupError> {
        Ok(self.source.value_or("http_addr", "0.0.0.0:8080")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_config::SourceFormat;

    fn startup(toml: &str) -> Startup {
        Startup::new(ConfigSource::from_str(toml, SourceFormat::Toml).unwrap()).unwrap()
    }

    #[test]
    fn test_staging_environment_selects_in_memory_stores() {
        let startup = startup("environment = \"staging\"\n");
        let container = startup.configure_services().unwrap();
        assert!(container.contains::<aegis_registry::IdentityStore>());
    }

    #[test]
    fn test_production_requires_connection_strings() {
        let startup = startup("");
        let err = startup.configure_services().unwrap_err();
        assert!(matches!(
            err,
            StartupError::Registry(RegistryError::MissingConnectionString { .. })
        ));
    }

    #[test]
    fn test_pipeline_from_staging_container() {
        let startup = startup(
            r#"
            environment = "staging"
            base_path = "/identity"

            [advanced]
            issuer_uri = "https://auth.example.com"
            docker_inner_location = "http://sts:80"
            docker_outer_location = "https://auth.example.com"
            "#,
        );

        let container = startup.configure_services().unwrap();
        let pipeline = startup.build_pipeline(&container).unwrap();

        assert!(pipeline.has_stage("docker_redirect"));
        assert_eq!(pipeline.stage_names().first().copied(), Some("cookie_policy"));
    }

    #[test]
    fn test_explicit_strategy_overrides_environment() {
        let startup = startup("");
        // Production environment, staging persistence: the seam in use.
        let container = startup.configure_services_with(&StagingPersistence).unwrap();
        assert!(startup.build_pipeline(&container).is_ok());
    }

    #[test]
    fn test_http_addr_default() {
        let startup = startup("");
        assert_eq!(startup.http_addr().unwrap(), "0.0.0.0:8080");
    }
}
