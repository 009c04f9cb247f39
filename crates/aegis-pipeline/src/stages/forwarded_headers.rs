//! Forwarded-headers normalization stage.
//!
//! Honors `X-Forwarded-For` and `X-Forwarded-Proto` only, each
//! independently; a proxy may set one without the other and the request
//! is still accepted. The known-networks and known-proxies allow-lists
//! exist in the options but are cleared at construction: trust is
//! delegated entirely to deployment-level network topology, never to a
//! list baked into the process.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Header carrying the original client address chain.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Header carrying the original scheme.
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Options for forwarded-header handling.
#[derive(Debug, Clone, Default)]
pub struct ForwardedHeadersOptions {
    /// Networks whose forwarded headers are trusted. Cleared: empty
    /// means trust is a deployment concern.
    pub known_networks: Vec<String>,
    /// Proxies whose forwarded headers are trusted. Cleared likewise.
    pub known_proxies: Vec<String>,
    /// Whether both headers must be present together. Never required
    /// here.
    pub require_header_symmetry: bool,
}

impl ForwardedHeadersOptions {
    /// The options this host runs with: no symmetry requirement and both
    /// allow-lists cleared.
    #[must_use]
    pub fn cleared() -> Self {
        Self {
            known_networks: Vec::new(),
            known_proxies: Vec::new(),
            require_header_symmetry: false,
        }
    }
}

/// Normalizes forwarded headers into the request context.
#[derive(Debug, Clone, Default)]
pub struct ForwardedHeadersStage {
    options: ForwardedHeadersOptions,
}

impl ForwardedHeadersStage {
    /// Creates the stage with [`ForwardedHeadersOptions::cleared`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: ForwardedHeadersOptions::cleared(),
        }
    }

    /// The active options.
    #[must_use]
    pub fn options(&self) -> &ForwardedHeadersOptions {
        &self.options
    }
}

impl Middleware for ForwardedHeadersStage {
    fn name(&self) -> &'static str {
        "forwarded_headers"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if let Some(forwarded_for) = request
                .headers()
                .get(X_FORWARDED_FOR)
                .and_then(|v| v.to_str().ok())
            {
                if let Some(client) = forwarded_for.split(',').next() {
                    let client = client.trim();
                    if !client.is_empty() {
                        ctx.set_client_addr(client);
                    }
                }
            }

            if let Some(proto) = request
                .headers()
                .get(X_FORWARDED_PROTO)
                .and_then(|v| v.to_str().ok())
            {
                let proto = proto.trim();
                if !proto.is_empty() {
                    ctx.set_scheme(proto.to_ascii_lowercase());
                }
            }

            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    fn ok() -> Next<'static> {
        Next::handler(|_ctx, _req| {
            Box::pin(async {
                http::Response::builder()
                    .status(StatusCode::OK)
                    .body(Full::new(Bytes::new()))
                    .unwrap()
            })
        })
    }

    fn request(headers: &[(&str, &str)]) -> Request {
        let mut builder = http::Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    #[tokio::test]
    async fn test_both_headers_honored() {
        let mut ctx = RequestContext::new();
        let req = request(&[
            (X_FORWARDED_FOR, "203.0.113.9, 10.0.0.1"),
            (X_FORWARDED_PROTO, "https"),
        ]);

        let response = ForwardedHeadersStage::new().handle(&mut ctx, req, ok()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(ctx.client_addr(), Some("203.0.113.9"));
        assert_eq!(ctx.scheme(), Some("https"));
    }

    #[tokio::test]
    async fn test_proto_without_for_is_accepted() {
        let mut ctx = RequestContext::new();
        let req = request(&[(X_FORWARDED_PROTO, "https")]);

        let response = ForwardedHeadersStage::new().handle(&mut ctx, req, ok()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(ctx.scheme(), Some("https"));
        assert!(ctx.client_addr().is_none());
    }

    #[tokio::test]
    async fn test_for_without_proto_is_accepted() {
        let mut ctx = RequestContext::new();
        let req = request(&[(X_FORWARDED_FOR, "203.0.113.9")]);

        let response = ForwardedHeadersStage::new().handle(&mut ctx, req, ok()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(ctx.client_addr(), Some("203.0.113.9"));
        assert!(ctx.scheme().is_none());
    }

    #[test]
    fn test_allow_lists_cleared() {
        let stage = ForwardedHeadersStage::new();
        assert!(stage.options().known_networks.is_empty());
        assert!(stage.options().known_proxies.is_empty());
        assert!(!stage.options().require_header_symmetry);
    }
}
