//! Path-base mounting stage.
//!
//! Mounts the application under a configured base path. When the request
//! path starts with the base, the base is stripped before routing and
//! recorded on the context; requests outside the base pass through
//! unchanged. An empty base mounts at the root and the stage is a no-op.

use http::Uri;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Strips the configured base path from matching requests.
#[derive(Debug, Clone)]
pub struct PathBaseStage {
    base_path: String,
}

impl PathBaseStage {
    /// Creates the stage; `base_path` may be empty for a root mount.
    #[must_use]
    pub fn new(base_path: impl Into<String>) -> Self {
        let mut base_path = base_path.into();
        // Normalize to a leading slash, no trailing slash.
        if !base_path.is_empty() && !base_path.starts_with('/') {
            base_path.insert(0, '/');
        }
        while base_path.ends_with('/') {
            base_path.pop();
        }
        Self { base_path }
    }

    /// The normalized base path.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    fn strip(&self, request: Request) -> (bool, Request) {
        if self.base_path.is_empty() {
            return (false, request);
        }

        let path = request.uri().path();
        let Some(remainder) = path.strip_prefix(&self.base_path) else {
            return (false, request);
        };
        // `/identity` must not match `/identityx`.
        if !remainder.is_empty() && !remainder.starts_with('/') {
            return (false, request);
        }

        let remainder = if remainder.is_empty() { "/" } else { remainder };
        let path_and_query = match request.uri().query() {
            Some(query) => format!("{remainder}?{query}"),
            None => remainder.to_string(),
        };

        let mut parts = request.uri().clone().into_parts();
        parts.path_and_query = path_and_query.parse().ok();
        let Ok(uri) = Uri::from_parts(parts) else {
            return (false, request);
        };

        let (mut req_parts, body) = request.into_parts();
        req_parts.uri = uri;
        (true, Request::from_parts(req_parts, body))
    }
}

impl Middleware for PathBaseStage {
    fn name(&self) -> &'static str {
        "path_base"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let (mounted, request) = self.strip(request);
            if mounted {
                ctx.set_base_path(self.base_path.clone());
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

    fn request(path: &str) -> Request {
        http::Request::builder()
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn seen_path(stage: &PathBaseStage, ctx: &mut RequestContext, path: &str) -> String {
        let next = Next::handler(|_ctx, req: Request| {
            let seen = req.uri().path_and_query().map(ToString::to_string);
            Box::pin(async move {
                http::Response::builder()
                    .status(StatusCode::OK)
                    .header("x-seen", seen.unwrap_or_default())
                    .body(Full::new(Bytes::new()))
                    .unwrap()
            })
        });
        let response = stage.handle(ctx, request(path), next).await;
        response.headers()["x-seen"].to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_empty_base_mounts_at_root() {
        let stage = PathBaseStage::new("");
        let mut ctx = RequestContext::new();
        assert_eq!(seen_path(&stage, &mut ctx, "/account/login").await, "/account/login");
        assert!(ctx.base_path().is_none());
    }

    #[tokio::test]
    async fn test_base_stripped_and_recorded() {
        let stage = PathBaseStage::new("/identity");
        let mut ctx = RequestContext::new();
        assert_eq!(
            seen_path(&stage, &mut ctx, "/identity/account/login?hint=x").await,
            "/account/login?hint=x"
        );
        assert_eq!(ctx.base_path(), Some("/identity"));
    }

    #[tokio::test]
    async fn test_exact_base_becomes_root() {
        let stage = PathBaseStage::new("identity/");
        let mut ctx = RequestContext::new();
        assert_eq!(seen_path(&stage, &mut ctx, "/identity").await, "/");
    }

    #[tokio::test]
    async fn test_non_matching_path_untouched() {
        let stage = PathBaseStage::new("/identity");
        let mut ctx = RequestContext::new();
        assert_eq!(seen_path(&stage, &mut ctx, "/identityx/other").await, "/identityx/other");
        assert!(ctx.base_path().is_none());
    }
}
