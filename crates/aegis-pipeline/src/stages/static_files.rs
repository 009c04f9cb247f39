//! Static file serving stage.
//!
//! Serves files from the configured web root, short-circuiting the
//! chain on a hit. GET and HEAD only. Traversal segments and hidden
//! files are rejected by falling through to routing, which will 404.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use http::{header, Method, StatusCode};
use http_body_util::Full;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Serves files under a root directory.
#[derive(Debug, Clone)]
pub struct StaticFilesStage {
    root: PathBuf,
}

impl StaticFilesStage {
    /// Creates the stage for the given web root.
    ///
    /// A missing directory is not an error; the stage simply never
    /// matches.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The configured web root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a request path to a file under the root, or `None` when
    /// the path is unsafe or does not name a file.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let trimmed = path.trim_start_matches('/');
        if trimmed.is_empty() {
            return None;
        }

        let candidate = Path::new(trimmed);
        for component in candidate.components() {
            match component {
                Component::Normal(segment) => {
                    if segment.to_str().is_some_and(|s| s.starts_with('.')) {
                        return None;
                    }
                }
                _ => return None,
            }
        }

        let resolved = self.root.join(candidate);
        resolved.is_file().then_some(resolved)
    }

    fn content_type(path: &Path) -> &'static str {
        match path.extension().and_then(|e| e.to_str()) {
            Some("html") => "text/html; charset=utf-8",
            Some("css") => "text/css; charset=utf-8",
            Some("js") => "text/javascript; charset=utf-8",
            Some("json") => "application/json",
            Some("png") => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("svg") => "image/svg+xml",
            Some("ico") => "image/x-icon",
            Some("woff2") => "font/woff2",
            Some("txt") => "text/plain; charset=utf-8",
            _ => "application/octet-stream",
        }
    }
}

impl Middleware for StaticFilesStage {
    fn name(&self) -> &'static str {
        "static_files"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if request.method() != Method::GET && request.method() != Method::HEAD {
                return next.run(ctx, request).await;
            }

            let Some(file) = self.resolve(request.uri().path()) else {
                return next.run(ctx, request).await;
            };

            match tokio::fs::read(&file).await {
                Ok(contents) => {
                    let body = if request.method() == Method::HEAD {
                        Bytes::new()
                    } else {
                        Bytes::from(contents)
                    };
                    http::Response::builder()
                        .status(StatusCode::OK)
                        .header(header::CONTENT_TYPE, Self::content_type(&file))
                        .body(Full::new(body))
                        .unwrap_or_else(|_| {
                            http::Response::new(Full::new(Bytes::new()))
                        })
                }
                Err(error) => {
                    tracing::warn!(path = %file.display(), %error, "static file read failed");
                    next.run(ctx, request).await
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn request(method: Method, path: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn fallthrough() -> Next<'static> {
        Next::handler(|_ctx, _req| {
            Box::pin(async {
                http::Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(Full::new(Bytes::from("routed")))
                    .unwrap()
            })
        })
    }

    #[tokio::test]
    async fn test_serves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("site.css"), "body {}").unwrap();

        let stage = StaticFilesStage::new(dir.path());
        let mut ctx = RequestContext::new();
        let response = stage
            .handle(&mut ctx, request(Method::GET, "/site.css"), fallthrough())
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css; charset=utf-8");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from("body {}"));
    }

    #[tokio::test]
    async fn test_head_omits_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("robots.txt"), "User-agent: *").unwrap();

        let stage = StaticFilesStage::new(dir.path());
        let mut ctx = RequestContext::new();
        let response = stage
            .handle(&mut ctx, request(Method::HEAD, "/robots.txt"), fallthrough())
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let stage = StaticFilesStage::new(dir.path());
        let mut ctx = RequestContext::new();
        let response = stage
            .handle(&mut ctx, request(Method::GET, "/nope.css"), fallthrough())
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let stage = StaticFilesStage::new(dir.path().join("public"));
        std::fs::create_dir(dir.path().join("public")).unwrap();
        std::fs::write(dir.path().join("secret.txt"), "keys").unwrap();

        let mut ctx = RequestContext::new();
        let response = stage
            .handle(
                &mut ctx,
                request(Method::GET, "/../secret.txt"),
                fallthrough(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_hidden_files_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "SECRET=1").unwrap();

        let stage = StaticFilesStage::new(dir.path());
        let mut ctx = RequestContext::new();
        let response = stage
            .handle(&mut ctx, request(Method::GET, "/.env"), fallthrough())
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_post_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("site.css"), "body {}").unwrap();

        let stage = StaticFilesStage::new(dir.path());
        let mut ctx = RequestContext::new();
        let response = stage
            .handle(&mut ctx, request(Method::POST, "/site.css"), fallthrough())
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
