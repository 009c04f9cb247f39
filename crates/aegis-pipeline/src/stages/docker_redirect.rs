//! Docker redirect rewrite stage.
//!
//! Corrects the mismatch between an internally addressed reverse-proxy
//! environment and the externally advertised issuer origin. The stage is
//! only built when BOTH the inner and outer location prefixes are
//! configured; the condition is evaluated once at pipeline construction,
//! never per request.
//!
//! Per request it does two things:
//!
//! 1. Before the rest of the chain runs, it forces the perceived
//!    external origin to the configured issuer URI, so every link and
//!    URL generated downstream uses the externally correct origin.
//! 2. After the response is fully produced, and only for 302 Found, it
//!    replaces every occurrence of the inner prefix in the `Location`
//!    header with the outer prefix. The replacement is a pure string
//!    substitution; no URL parsing or validation happens here.
//!
//! A 302 without a `Location` header is a recoverable condition: the
//! stage logs it and passes the response through unmodified. This is
//! best-effort repair, not a guarantee.

use http::header::LOCATION;
use http::{HeaderValue, StatusCode};

use aegis_config::AdvancedConfiguration;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Rewrites `Location` headers from the container-visible prefix to the
/// externally reachable one.
#[derive(Debug, Clone)]
pub struct DockerRedirectStage {
    issuer_uri: String,
    inner_location: String,
    outer_location: String,
}

impl DockerRedirectStage {
    /// Builds the stage from the advanced configuration.
    ///
    /// Returns `None` unless both location prefixes are non-blank; the
    /// caller inserts the stage only when it exists.
    #[must_use]
    pub fn from_configuration(advanced: &AdvancedConfiguration) -> Option<Self> {
        if !advanced.rewrite_active() {
            return None;
        }
        Some(Self {
            issuer_uri: advanced.issuer_uri.clone(),
            inner_location: advanced.docker_inner_location.clone(),
            outer_location: advanced.docker_outer_location.clone(),
        })
    }

    fn rewrite(&self, location: &str) -> String {
        location.replace(&self.inner_location, &self.outer_location)
    }
}

impl Middleware for DockerRedirectStage {
    fn name(&self) -> &'static str {
        "docker_redirect"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let path = request.uri().path().to_string();

            ctx.set_issuer_origin(self.issuer_uri.clone());

            let mut response = next.run(ctx, request).await;

            if response.status() != StatusCode::FOUND {
                return response;
            }

            let Some(location) = response.headers().get(LOCATION).cloned() else {
                tracing::warn!(%path, "302 response is missing its Location header");
                return response;
            };

            let Ok(location) = location.to_str() else {
                tracing::warn!(%path, "302 Location header is not valid UTF-8, left untouched");
                return response;
            };

            let rewritten = self.rewrite(location);
            match HeaderValue::from_str(&rewritten) {
                Ok(value) => {
                    response.headers_mut().insert(LOCATION, value);
                }
                Err(_) => {
                    tracing::warn!(%path, "rewritten Location is not a valid header value");
                }
            }

            response
        })
    }
}
