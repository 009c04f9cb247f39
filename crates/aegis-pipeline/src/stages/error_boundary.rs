//! Error boundary and HSTS stages.
//!
//! The second pipeline slot branches on environment: development gets a
//! boundary that turns server errors into verbose diagnostics, anything
//! else gets HSTS enforcement. Both are fixed at build time.

use std::sync::Arc;

use http::header::STRICT_TRANSPORT_SECURITY;
use http::{HeaderValue, StatusCode};

use aegis_registry::HstsPolicy;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};

/// Development-only boundary that surfaces recorded error detail.
///
/// Stages and handlers that fail record detail on the context and emit a
/// generic 500; this stage, present only in development, replaces the
/// generic body with the diagnostics. In production there is no verbose
/// path: the generic response is what the client sees.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorBoundaryStage;

impl ErrorBoundaryStage {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for ErrorBoundaryStage {
    fn name(&self) -> &'static str {
        "error_boundary"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let path = request.uri().path().to_string();
            let response = next.run(ctx, request).await;

            if response.status() == StatusCode::INTERNAL_SERVER_ERROR {
                if let Some(detail) = ctx.error_detail() {
                    tracing::error!(%path, %detail, "request failed");
                    return Response::error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        &format!("error processing {path}\n\n{detail}"),
                    );
                }
            }

            response
        })
    }
}

/// Adds `Strict-Transport-Security` to every response.
#[derive(Debug)]
pub struct HstsStage {
    header_value: HeaderValue,
    policy: Arc<HstsPolicy>,
}

impl HstsStage {
    /// Creates the stage from the registered policy.
    #[must_use]
    pub fn new(policy: Arc<HstsPolicy>) -> Self {
        let header_value = HeaderValue::from_str(&policy.header_value())
            .unwrap_or_else(|_| HeaderValue::from_static("max-age=31536000"));
        Self {
            header_value,
            policy,
        }
    }

    /// The policy this stage enforces.
    #[must_use]
    pub fn policy(&self) -> &HstsPolicy {
        &self.policy
    }
}

impl Middleware for HstsStage {
    fn name(&self) -> &'static str {
        "hsts"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut response = next.run(ctx, request).await;
            response
                .headers_mut()
                .insert(STRICT_TRANSPORT_SECURITY, self.header_value.clone());
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};

    fn request() -> Request {
        http::Request::builder()
            .uri("/account/login")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_hsts_header_applied() {
        let stage = HstsStage::new(Arc::new(HstsPolicy::fixed()));
        let mut ctx = RequestContext::new();
        let next = Next::handler(|_ctx, _req| {
            Box::pin(async {
                http::Response::builder()
                    .status(StatusCode::OK)
                    .body(Full::new(Bytes::new()))
                    .unwrap()
            })
        });

        let response = stage.handle(&mut ctx, request(), next).await;
        assert_eq!(
            response.headers()[STRICT_TRANSPORT_SECURITY],
            "max-age=31536000; includeSubDomains; preload"
        );
    }

    #[tokio::test]
    async fn test_boundary_enriches_500_with_detail() {
        let mut ctx = RequestContext::new();
        let next = Next::handler(|ctx: &mut RequestContext, _req| {
            ctx.set_error_detail("grant store timed out");
            Box::pin(async {
                Response::error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            })
        });

        let response = ErrorBoundaryStage::new().handle(&mut ctx, request(), next).await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("grant store timed out"));
        assert!(body.contains("/account/login"));
    }

    #[tokio::test]
    async fn test_boundary_leaves_success_untouched() {
        let mut ctx = RequestContext::new();
        let next = Next::handler(|_ctx, _req| {
            Box::pin(async {
                http::Response::builder()
                    .status(StatusCode::OK)
                    .body(Full::new(Bytes::from("fine")))
                    .unwrap()
            })
        });

        let response = ErrorBoundaryStage::new().handle(&mut ctx, request(), next).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
