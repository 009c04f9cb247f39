//! Endpoint dispatch.
//!
//! The terminal point of the pipeline: the default
//! `{controller}/{action}` route maps to handlers the host installed,
//! plus one fixed liveness endpoint at `/health` that serves the
//! aggregated health report in its UI-consumable JSON shape.

use std::collections::HashMap;
use std::sync::Arc;

use http::StatusCode;

use aegis_registry::HealthRegistry;

use crate::context::RequestContext;
use crate::middleware::BoxFuture;
use crate::types::{Request, Response, ResponseExt};

/// Path of the fixed liveness endpoint.
pub const HEALTH_PATH: &str = "/health";

/// An installed endpoint handler.
///
/// Receives an owned snapshot of the request context; by dispatch time
/// every stage has finished its request-side work, so the snapshot is
/// complete.
pub type EndpointHandler =
    Arc<dyn Fn(RequestContext, Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// The endpoint table dispatch resolves against.
pub struct Endpoints {
    controllers: HashMap<(String, String), EndpointHandler>,
    health: Arc<HealthRegistry>,
}

impl Endpoints {
    /// Creates the table with the fixed health endpoint.
    #[must_use]
    pub fn new(health: Arc<HealthRegistry>) -> Self {
        Self {
            controllers: HashMap::new(),
            health,
        }
    }

    /// Installs a handler for a controller/action pair.
    pub fn map_controller<F>(&mut self, controller: &str, action: &str, handler: F)
    where
        F: Fn(RequestContext, Request) -> BoxFuture<'static, Response> + Send + Sync + 'static,
    {
        self.insert_handler(controller, action, Arc::new(handler));
    }

    /// Installs an already-boxed handler; used by the pipeline builder.
    pub(crate) fn insert_handler(
        &mut self,
        controller: &str,
        action: &str,
        handler: EndpointHandler,
    ) {
        self.controllers.insert(
            (
                controller.to_ascii_lowercase(),
                action.to_ascii_lowercase(),
            ),
            handler,
        );
    }

    /// Number of installed controller handlers.
    #[must_use]
    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    /// Dispatches a request to the health endpoint or a controller.
    pub async fn dispatch(&self, ctx: RequestContext, request: Request) -> Response {
        if request.uri().path() == HEALTH_PATH {
            return self.health_response();
        }

        let Some(route) = ctx.route().cloned() else {
            return Response::error(StatusCode::NOT_FOUND, "not found");
        };

        match self.controllers.get(&(route.controller, route.action)) {
            Some(handler) => handler(ctx, request).await,
            None => Response::error(StatusCode::NOT_FOUND, "not found"),
        }
    }

    fn health_response(&self) -> Response {
        let report = self.health.report();
        let status = if report.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        match serde_json::to_value(&report) {
            Ok(value) => Response::json(status, &value),
            Err(error) => {
                tracing::error!(%error, "failed to serialize health report");
                Response::error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}

impl std::fmt::Debug for Endpoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoints")
            .field("controllers", &self.controllers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RouteData;
    use aegis_registry::CheckStatus;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};

    fn request(path: &str) -> Request {
        http::Request::builder()
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn endpoints(health: HealthRegistry) -> Endpoints {
        Endpoints::new(Arc::new(health))
    }

    #[tokio::test]
    async fn test_health_endpoint_serves_report() {
        let e = endpoints(HealthRegistry::new().add_check("identity", || CheckStatus::Healthy));
        let response = e.dispatch(RequestContext::new(), request("/health")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "Healthy");
        assert_eq!(json["entries"]["identity"]["status"], "Healthy");
    }

    #[tokio::test]
    async fn test_unhealthy_report_is_503() {
        let e = endpoints(
            HealthRegistry::new().add_check("grants", || CheckStatus::unhealthy("down")),
        );
        let response = e.dispatch(RequestContext::new(), request("/health")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_controller_dispatch() {
        let mut e = endpoints(HealthRegistry::new());
        e.map_controller("Home", "Index", |_ctx, _req| {
            Box::pin(async {
                http::Response::builder()
                    .status(StatusCode::OK)
                    .body(Full::new(Bytes::from("welcome")))
                    .unwrap()
            })
        });

        let mut ctx = RequestContext::new();
        ctx.set_route(RouteData::new("home", "index"));
        let response = e.dispatch(ctx, request("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unmapped_route_is_404() {
        let e = endpoints(HealthRegistry::new());
        let mut ctx = RequestContext::new();
        ctx.set_route(RouteData::new("missing", "index"));
        let response = e.dispatch(ctx, request("/missing")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
