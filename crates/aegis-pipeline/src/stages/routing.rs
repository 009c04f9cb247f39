//! Routing stage.
//!
//! Resolves the default `{controller}/{action}` route: `/` maps to
//! (home, index), a single segment maps to (segment, index), and two or
//! more segments map to (first, second). Segments are lowercased so
//! dispatch lookups are case-insensitive.

use crate::context::{RequestContext, RouteData};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Resolves the default controller route.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingStage;

impl RoutingStage {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolves a path to route data.
    #[must_use]
    pub fn resolve(path: &str) -> RouteData {
        let mut segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_ascii_lowercase);

        let controller = segments.next().unwrap_or_else(|| "home".to_string());
        let action = segments.next().unwrap_or_else(|| "index".to_string());
        RouteData::new(controller, action)
    }
}

impl Middleware for RoutingStage {
    fn name(&self) -> &'static str {
        "routing"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            ctx.set_route(Self::resolve(request.uri().path()));
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_maps_to_home_index() {
        assert_eq!(RoutingStage::resolve("/"), RouteData::new("home", "index"));
    }

    #[test]
    fn test_single_segment_maps_to_index() {
        assert_eq!(
            RoutingStage::resolve("/account"),
            RouteData::new("account", "index")
        );
    }

    #[test]
    fn test_controller_and_action() {
        assert_eq!(
            RoutingStage::resolve("/Account/Login"),
            RouteData::new("account", "login")
        );
    }

    #[test]
    fn test_extra_segments_ignored() {
        assert_eq!(
            RoutingStage::resolve("/connect/authorize/callback"),
            RouteData::new("connect", "authorize")
        );
    }
}
