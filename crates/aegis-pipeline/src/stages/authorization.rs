//! Authorization enforcement stage.
//!
//! Enforces the registered policy set against the route resolved by the
//! routing stage. Administration routes require the administration
//! policy; the registration route exists only while its policy does, so
//! a disabled registration answers 404 rather than 403, the same as any
//! other unmapped route.

use std::sync::Arc;

use http::StatusCode;

use aegis_registry::{AuthorizationPolicies, ADMINISTRATION_POLICY, REGISTRATION_POLICY};

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};

/// Controller guarded by the administration policy.
const ADMIN_CONTROLLER: &str = "admin";

/// Controller guarded by the registration policy.
const REGISTER_CONTROLLER: &str = "register";

/// Enforces authorization policies against the resolved route.
#[derive(Debug)]
pub struct AuthorizationStage {
    policies: Arc<AuthorizationPolicies>,
}

impl AuthorizationStage {
    /// Creates the stage over the registered policy set.
    #[must_use]
    pub fn new(policies: Arc<AuthorizationPolicies>) -> Self {
        Self { policies }
    }
}

impl Middleware for AuthorizationStage {
    fn name(&self) -> &'static str {
        "authorization"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let controller = ctx.route().map(|r| r.controller.clone()).unwrap_or_default();

            match controller.as_str() {
                ADMIN_CONTROLLER => {
                    if !self.policies.evaluate(ADMINISTRATION_POLICY, ctx.identity()) {
                        tracing::debug!(%controller, "administration policy denied request");
                        return Response::error(StatusCode::FORBIDDEN, "forbidden");
                    }
                }
                REGISTER_CONTROLLER => {
                    if !self.policies.has_policy(REGISTRATION_POLICY) {
                        // Registration is switched off entirely; the route
                        // does not exist for anyone.
                        return Response::error(StatusCode::NOT_FOUND, "not found");
                    }
                }
                _ => {}
            }

            next.run(ctx, request).await
        })
    }
}
