//! Per-request pipeline context.
//!
//! The [`RequestContext`] carries the state stages accumulate on the way
//! down the chain: the perceived issuer origin, the mounted base path,
//! the negotiated locale, the caller identity, the resolved route, and
//! the forwarded client address/scheme. Stages that mutate the response
//! on the way back up (cookie policy, the redirect rewriter) read the
//! same context, so anything set by a downstream stage is visible during
//! the unwind.

use std::time::Instant;

use aegis_registry::Identity;

/// Route resolved by the routing stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteData {
    /// Controller segment, lowercased.
    pub controller: String,
    /// Action segment, lowercased.
    pub action: String,
}

impl RouteData {
    /// Creates route data.
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
        }
    }
}

/// Mutable state flowing through one request's middleware chain.
#[derive(Debug, Clone)]
pub struct RequestContext {
    issuer_origin: Option<String>,
    base_path: Option<String>,
    locale: Option<String>,
    identity: Identity,
    route: Option<RouteData>,
    client_addr: Option<String>,
    scheme: Option<String>,
    error_detail: Option<String>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a fresh context for one request.
    #[must_use]
    pub fn new() -> Self {
        Self {
            issuer_origin: None,
            base_path: None,
            locale: None,
            identity: Identity::Anonymous,
            route: None,
            client_addr: None,
            scheme: None,
            error_detail: None,
            started_at: Instant::now(),
        }
    }

    /// The externally perceived origin, when forced by the rewrite stage.
    #[must_use]
    pub fn issuer_origin(&self) -> Option<&str> {
        self.issuer_origin.as_deref()
    }

    /// Forces the perceived external origin for downstream URL building.
    pub fn set_issuer_origin(&mut self, origin: impl Into<String>) {
        self.issuer_origin = Some(origin.into());
    }

    /// The stripped base path, when the request was mounted under one.
    #[must_use]
    pub fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    /// Records the mounted base path.
    pub fn set_base_path(&mut self, base_path: impl Into<String>) {
        self.base_path = Some(base_path.into());
    }

    /// The negotiated locale, once the localization stage has run.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Records the negotiated locale.
    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = Some(locale.into());
    }

    /// The caller identity; anonymous until the authentication stage runs.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Records the caller identity.
    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = identity;
    }

    /// The resolved route, once the routing stage has run.
    #[must_use]
    pub fn route(&self) -> Option<&RouteData> {
        self.route.as_ref()
    }

    /// Records the resolved route.
    pub fn set_route(&mut self, route: RouteData) {
        self.route = Some(route);
    }

    /// The forwarded client address, when a proxy supplied one.
    #[must_use]
    pub fn client_addr(&self) -> Option<&str> {
        self.client_addr.as_deref()
    }

    /// Records the forwarded client address.
    pub fn set_client_addr(&mut self, addr: impl Into<String>) {
        self.client_addr = Some(addr.into());
    }

    /// The forwarded scheme, when a proxy supplied one.
    #[must_use]
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// Records the forwarded scheme.
    pub fn set_scheme(&mut self, scheme: impl Into<String>) {
        self.scheme = Some(scheme.into());
    }

    /// Error detail recorded by a failing stage or handler.
    #[must_use]
    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    /// Records error detail for the error boundary.
    pub fn set_error_detail(&mut self, detail: impl Into<String>) {
        self.error_detail = Some(detail.into());
    }

    /// When the request entered the pipeline.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_registry::Subject;

    #[test]
    fn test_fresh_context_is_anonymous() {
        let ctx = RequestContext::new();
        assert!(!ctx.identity().is_authenticated());
        assert!(ctx.issuer_origin().is_none());
        assert!(ctx.route().is_none());
    }

    #[test]
    fn test_accumulated_state() {
        let mut ctx = RequestContext::new();
        ctx.set_issuer_origin("https://auth.example.com");
        ctx.set_base_path("/identity");
        ctx.set_locale("sv");
        ctx.set_identity(Identity::Subject(Subject::new("u-1", "alice")));
        ctx.set_route(RouteData::new("home", "index"));
        ctx.set_scheme("https");
        ctx.set_client_addr("203.0.113.9");

        assert_eq!(ctx.issuer_origin(), Some("https://auth.example.com"));
        assert_eq!(ctx.base_path(), Some("/identity"));
        assert_eq!(ctx.locale(), Some("sv"));
        assert!(ctx.identity().is_authenticated());
        assert_eq!(ctx.route().unwrap().controller, "home");
        assert_eq!(ctx.scheme(), Some("https"));
        assert_eq!(ctx.client_addr(), Some("203.0.113.9"));
    }
}
