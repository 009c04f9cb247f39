//! Authentication stage.
//!
//! Invokes the registered authentication capability with the session
//! token from the request cookies and records the resulting identity.
//! Authentication never fails a request here; unauthenticated callers
//! continue as anonymous and authorization decides what they may reach.

use std::sync::Arc;

use http::header::COOKIE;

use aegis_registry::{AuthenticationService, SESSION_COOKIE};

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Resolves the caller identity from the session cookie.
#[derive(Debug)]
pub struct AuthenticationStage {
    service: Arc<AuthenticationService>,
}

impl AuthenticationStage {
    /// Creates the stage over the registered service.
    #[must_use]
    pub fn new(service: Arc<AuthenticationService>) -> Self {
        Self { service }
    }

    fn session_token(request: &Request) -> Option<String> {
        let header = request.headers().get(COOKIE)?.to_str().ok()?;
        header.split(';').find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name.trim() == SESSION_COOKIE).then(|| value.trim().to_string())
        })
    }
}

impl Middleware for AuthenticationStage {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let token = Self::session_token(&request);
            let identity = self.service.authenticate(token.as_deref());
            ctx.set_identity(identity);
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_registry::{IdentityStore, StandardRole, StandardUser, StoreBackend, Subject};
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    fn stage_with_session(token: &str) -> AuthenticationStage {
        let store = Arc::new(IdentityStore::new(StoreBackend::InMemory));
        store.insert_session(token, Subject::new("u-1", "alice"));
        AuthenticationStage::new(Arc::new(
            AuthenticationService::bound::<StandardUser, StandardRole>(store),
        ))
    }

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

    #[tokio::test]
    async fn test_session_cookie_resolves_identity() {
        let stage = stage_with_session("tok-1");
        let request = http::Request::builder()
            .uri("/")
            .header(COOKIE, format!("other=x; {SESSION_COOKIE}=tok-1"))
            .body(Full::new(Bytes::new()))
            .unwrap();

        let mut ctx = RequestContext::new();
        stage.handle(&mut ctx, request, ok()).await;
        assert!(ctx.identity().is_authenticated());
    }

    #[tokio::test]
    async fn test_no_cookie_stays_anonymous() {
        let stage = stage_with_session("tok-1");
        let request = http::Request::builder()
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let mut ctx = RequestContext::new();
        stage.handle(&mut ctx, request, ok()).await;
        assert!(!ctx.identity().is_authenticated());
    }

    #[tokio::test]
    async fn test_unknown_token_stays_anonymous() {
        let stage = stage_with_session("tok-1");
        let request = http::Request::builder()
            .uri("/")
            .header(COOKIE, format!("{SESSION_COOKIE}=stale"))
            .body(Full::new(Bytes::new()))
            .unwrap();

        let mut ctx = RequestContext::new();
        stage.handle(&mut ctx, request, ok()).await;
        assert!(!ctx.identity().is_authenticated());
    }
}
