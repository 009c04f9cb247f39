//! Fixed-order request pipeline for the Aegis STS host.
//!
//! This crate assembles the ordered middleware chain every inbound
//! request flows through. The chain is built exactly once at startup by
//! the [`PipelineBuilder`]; from then on it is immutable and shared
//! across all concurrently handled requests. The only conditionally
//! present stage is the docker redirect rewriter, inserted when both
//! reverse-proxy location prefixes are configured.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use aegis_config::{AdvancedConfiguration, ConfigSource, HostEnvironment, RootConfiguration};
//! use aegis_pipeline::PipelineBuilder;
//! use aegis_registry::{
//!     CapabilityRegistrar, ServiceContainer, StagingPersistence, StandardRole, StandardUser,
//! };
//!
//! # fn main() -> Result<(), aegis_registry::RegistryError> {
//! let source = ConfigSource::empty();
//! let root = Arc::new(RootConfiguration::bind(&source)?);
//!
//! let mut container = ServiceContainer::new();
//! CapabilityRegistrar::new(source.clone(), root)
//!     .register_all::<StandardUser, StandardRole>(&mut container, &StagingPersistence)?;
//!
//! let pipeline = PipelineBuilder::new(
//!     HostEnvironment::bind(&source)?,
//!     AdvancedConfiguration::bind(&source)?,
//! )
//! .build(&container)?;
//!
//! assert!(pipeline.has_stage("authentication"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod builder;
mod context;
mod dispatch;
mod middleware;
pub mod stages;
mod types;

pub use builder::{Pipeline, PipelineBuilder, DEFAULT_STATIC_ROOT};
pub use context::{RequestContext, RouteData};
pub use dispatch::{EndpointHandler, Endpoints, HEALTH_PATH};
pub use middleware::{BoxFuture, Middleware, Next};
pub use types::{Request, Response, ResponseExt};
