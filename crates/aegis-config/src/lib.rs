//! Typed configuration binding for the Aegis STS host.
//!
//! This crate owns the startup-time configuration story:
//!
//! - [`ConfigSource`] - a named-section configuration source loaded once
//!   from a TOML or JSON file, with `AEGIS_*` environment overrides
//! - [`RootConfiguration`] - the process-wide admin + registration
//!   settings, bound once and shared read-only
//! - [`AdvancedConfiguration`] - optional reverse-proxy settings whose
//!   docker location pair gates the redirect-rewrite pipeline stage
//! - [`HostEnvironment`] - development/staging/production switch
//!
//! Binding is tolerant of absent sections (they yield defaults) and
//! strict about present ones (a type mismatch is a fatal
//! [`ConfigError::Binding`]).
//!
//! # Example
//!
//! ```no_run
//! use aegis_config::{AdvancedConfiguration, ConfigSource, RootConfiguration};
//!
//! # fn main() -> Result<(), aegis_config::ConfigError> {
//! let source = ConfigSource::from_file("aegis.toml")?.with_env_overrides();
//! let root = RootConfiguration::bind(&source)?;
//! let advanced = AdvancedConfiguration::bind(&source)?;
//!
//! if advanced.rewrite_active() {
//!     println!("redirect rewriting enabled for {}", advanced.issuer_uri);
//! }
//! # let _ = root;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod advanced;
mod error;
mod root;
mod source;

pub use advanced::{AdvancedConfiguration, HostEnvironment, ADVANCED_SECTION};
pub use error::ConfigError;
pub use root::{
    AdminConfiguration, RegisterConfiguration, RootConfiguration, ADMIN_SECTION,
    REGISTER_SECTION,
};
pub use source::{ConfigSource, SourceFormat, ENV_PREFIX};
