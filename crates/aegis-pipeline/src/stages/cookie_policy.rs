//! Cookie-policy enforcement stage.
//!
//! Runs first in the chain and touches the response last: every outbound
//! `Set-Cookie` gets a `SameSite=Lax` attribute when none is declared,
//! and a `Secure` attribute when the request arrived over HTTPS (as
//! reported by the forwarded-headers stage, which has already run by the
//! time the unwind reaches this stage).

use http::header::SET_COOKIE;
use http::HeaderValue;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Applies the cookie policy to outbound `Set-Cookie` headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePolicyStage;

impl CookiePolicyStage {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn apply(value: &str, secure_scheme: bool) -> String {
        let lower = value.to_ascii_lowercase();
        let mut applied = value.to_string();
        if !lower.contains("samesite") {
            applied.push_str("; SameSite=Lax");
        }
        if secure_scheme && !lower.contains("secure") {
            applied.push_str("; Secure");
        }
        applied
    }
}

impl Middleware for CookiePolicyStage {
    fn name(&self) -> &'static str {
        "cookie_policy"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut response = next.run(ctx, request).await;

            let secure_scheme = ctx.scheme() == Some("https");
            let cookies: Vec<String> = response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(|v| Self::apply(v, secure_scheme))
                .collect();

            if !cookies.is_empty() {
                response.headers_mut().remove(SET_COOKIE);
                for cookie in cookies {
                    if let Ok(value) = HeaderValue::from_str(&cookie) {
                        response.headers_mut().append(SET_COOKIE, value);
                    }
                }
            }

            response
        })
    }
}
