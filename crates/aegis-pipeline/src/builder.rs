//! Pipeline construction.
//!
//! The builder assembles the ordered middleware chain exactly once at
//! startup. The order is a correctness contract:
//!
//! 1. cookie policy
//! 2. development error boundary, or HSTS outside development
//! 3. docker redirect rewrite - the only conditional stage, present iff
//!    both docker locations are configured, and always before path-base
//!    so it sees the original request path
//! 4. path-base mounting
//! 5. security headers
//! 6. static files
//! 7. authentication
//! 8. localization
//! 9. routing
//! 10. authorization
//! 11. forwarded headers
//! 12. endpoint dispatch (default controller route + `/health`)
//!
//! Conditions are evaluated here, never per request.

use std::path::PathBuf;
use std::sync::Arc;

use aegis_config::{AdvancedConfiguration, HostEnvironment};
use aegis_registry::{
    AuthenticationService, AuthorizationPolicies, HealthRegistry, HstsPolicy, Localization,
    RegistryError, ServiceContainer,
};

use crate::context::RequestContext;
use crate::dispatch::{EndpointHandler, Endpoints};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::{
    AuthenticationStage, AuthorizationStage, CookiePolicyStage, DockerRedirectStage,
    ErrorBoundaryStage, ForwardedHeadersStage, HstsStage, LocalizationStage, PathBaseStage,
    RoutingStage, SecurityHeadersStage, StaticFilesStage,
};
use crate::types::{Request, Response};

/// Default web root for static files.
pub const DEFAULT_STATIC_ROOT: &str = "wwwroot";

/// Builds the fixed-order [`Pipeline`] from configuration and the
/// registered capability set.
pub struct PipelineBuilder {
    environment: HostEnvironment,
    advanced: AdvancedConfiguration,
    base_path: String,
    static_root: PathBuf,
    controllers: Vec<(String, String, EndpointHandler)>,
}

impl PipelineBuilder {
    /// Creates a builder for the given environment and advanced
    /// configuration.
    #[must_use]
    pub fn new(environment: HostEnvironment, advanced: AdvancedConfiguration) -> Self {
        Self {
            environment,
            advanced,
            base_path: String::new(),
            static_root: PathBuf::from(DEFAULT_STATIC_ROOT),
            controllers: Vec::new(),
        }
    }

    /// Sets the base path the application mounts under; empty mounts at
    /// the root.
    #[must_use]
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Sets the static file web root.
    #[must_use]
    pub fn static_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.static_root = root.into();
        self
    }

    /// Installs an endpoint handler for a controller/action pair.
    #[must_use]
    pub fn map_controller<F>(mut self, controller: &str, action: &str, handler: F) -> Self
    where
        F: Fn(RequestContext, Request) -> BoxFuture<'static, Response> + Send + Sync + 'static,
    {
        self.controllers
            .push((controller.to_string(), action.to_string(), Arc::new(handler)));
        self
    }

    /// Assembles the pipeline.
    ///
    /// # Errors
    ///
    /// Fails when a required capability was never registered; that is a
    /// startup-order bug and fatal.
    pub fn build(self, container: &ServiceContainer) -> Result<Pipeline, RegistryError> {
        let mut stages: Vec<Arc<dyn Middleware>> = Vec::new();

        stages.push(Arc::new(CookiePolicyStage::new()));

        if self.environment.is_development() {
            stages.push(Arc::new(ErrorBoundaryStage::new()));
        } else {
            stages.push(Arc::new(HstsStage::new(container.expect::<HstsPolicy>()?)));
        }

        if let Some(docker) = DockerRedirectStage::from_configuration(&self.advanced) {
            tracing::info!(
                inner = %self.advanced.docker_inner_location,
                outer = %self.advanced.docker_outer_location,
                "redirect rewriting enabled"
            );
            stages.push(Arc::new(docker));
        }

        stages.push(Arc::new(PathBaseStage::new(self.base_path)));
        stages.push(Arc::new(SecurityHeadersStage::new()));
        stages.push(Arc::new(StaticFilesStage::new(self.static_root)));
        stages.push(Arc::new(AuthenticationStage::new(
            container.expect::<AuthenticationService>()?,
        )));
        stages.push(Arc::new(LocalizationStage::new(
            container.expect::<Localization>()?,
        )));
        stages.push(Arc::new(RoutingStage::new()));
        stages.push(Arc::new(AuthorizationStage::new(
            container.expect::<AuthorizationPolicies>()?,
        )));
        stages.push(Arc::new(ForwardedHeadersStage::new()));

        let mut endpoints = Endpoints::new(container.expect::<HealthRegistry>()?);
        for (controller, action, handler) in self.controllers {
            endpoints.insert_handler(&controller, &action, handler);
        }

        Ok(Pipeline {
            stages,
            endpoints: Arc::new(endpoints),
        })
    }
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("environment", &self.environment)
            .field("base_path", &self.base_path)
            .field("controllers", &self.controllers.len())
            .finish()
    }
}

/// The immutable middleware chain every request flows through.
///
/// Built once at startup; `handle` runs one request through the chain
/// sequentially, then unwinds through the same stages in reverse.
pub struct Pipeline {
    stages: Vec<Arc<dyn Middleware>>,
    endpoints: Arc<Endpoints>,
}

impl Pipeline {
    /// Runs one request through the chain with a fresh context.
    pub async fn handle(&self, request: Request) -> Response {
        let mut ctx = RequestContext::new();
        self.handle_with_context(&mut ctx, request).await
    }

    /// Runs one request through the chain with a caller-provided
    /// context, which afterwards holds the accumulated per-request
    /// state.
    pub async fn handle_with_context(
        &self,
        ctx: &mut RequestContext,
        request: Request,
    ) -> Response {
        let endpoints = Arc::clone(&self.endpoints);
        let mut next = Next::handler(move |ctx: &mut RequestContext, request: Request| {
            let snapshot = ctx.clone();
            Box::pin(async move { endpoints.dispatch(snapshot, request).await })
        });

        for stage in self.stages.iter().rev() {
            next = Next::new(stage.as_ref(), next);
        }

        next.run(ctx, request).await
    }

    /// Stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Whether a stage with the given name is present.
    #[must_use]
    pub fn has_stage(&self, name: &str) -> bool {
        self.stages.iter().any(|s| s.name() == name)
    }

    /// Number of stages in the chain.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}
