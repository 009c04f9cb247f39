//! Security response headers stage.

use http::HeaderValue;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

const HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "SAMEORIGIN"),
    ("referrer-policy", "no-referrer"),
    ("content-security-policy", "default-src 'self'"),
];

/// Adds the standard security headers to every response.
///
/// Headers an endpoint already set are left alone, so a handler can
/// relax the CSP for a specific page without fighting the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityHeadersStage;

impl SecurityHeadersStage {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for SecurityHeadersStage {
    fn name(&self) -> &'static str {
        "security_headers"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut response = next.run(ctx, request).await;

            for (name, value) in HEADERS {
                if !response.headers().contains_key(*name) {
                    response
                        .headers_mut()
                        .insert(*name, HeaderValue::from_static(value));
                }
            }

            response
        })
    }
}
