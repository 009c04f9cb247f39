//! Default controller handlers installed by the host.
//!
//! The view layer proper (templates, account management forms) is
//! supplied elsewhere; these handlers cover the routes the host itself
//! owns: a landing page, the login redirect into the protocol engine,
//! and the registration entry point.

use std::sync::Arc;

use bytes::Bytes;
use http::{header, StatusCode};
use http_body_util::Full;

use aegis_pipeline::{BoxFuture, Request, RequestContext, Response, ResponseExt};
use aegis_registry::TokenIssuer;

/// Landing page handler.
pub fn home(_ctx: RequestContext, _request: Request) -> BoxFuture<'static, Response> {
    Box::pin(async {
        http::Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .body(Full::new(Bytes::from(
                "<html><body><h1>Aegis</h1><p>Security token service</p></body></html>",
            )))
            .unwrap_or_else(|_| Response::error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error"))
    })
}

/// Login handler: redirects into the authorize endpoint of the protocol
/// engine, building the URL on the perceived external origin.
pub fn login(
    issuer: Arc<TokenIssuer>,
) -> impl Fn(RequestContext, Request) -> BoxFuture<'static, Response> + Send + Sync {
    move |ctx, request| {
        let issuer = Arc::clone(&issuer);
        Box::pin(async move {
            let query = request.uri().query().map(str::to_string);
            let mut target =
                issuer.absolute_url(ctx.issuer_origin(), "/connect/authorize/callback");
            if let Some(query) = query {
                target.push('?');
                target.push_str(&query);
            }

            match http::Response::builder()
                .status(StatusCode::FOUND)
                .header(header::LOCATION, target)
                .body(Full::new(Bytes::new()))
            {
                Ok(response) => response,
                Err(_) => Response::error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error"),
            }
        })
    }
}

/// Registration entry point; only reachable while the registration
/// policy exists.
pub fn register(_ctx: RequestContext, _request: Request) -> BoxFuture<'static, Response> {
    Box::pin(async {
        http::Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .body(Full::new(Bytes::from(
                "<html><body><h1>Create account</h1></body></html>",
            )))
            .unwrap_or_else(|_| Response::error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_registry::{ConfigurationStore, GrantStore, StoreBackend};

    fn issuer(uri: &str) -> Arc<TokenIssuer> {
        Arc::new(TokenIssuer::new(
            Arc::new(ConfigurationStore::new(StoreBackend::InMemory)),
            Arc::new(GrantStore::new(StoreBackend::InMemory)),
            uri,
        ))
    }

    fn request(path: &str) -> Request {
        http::Request::builder()
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_redirects_to_authorize() {
        let handler = login(issuer("https://auth.example.com"));
        let response = handler(RequestContext::new(), request("/account/login?code=abc")).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://auth.example.com/connect/authorize/callback?code=abc"
        );
    }

    #[tokio::test]
    async fn test_login_prefers_forced_origin() {
        let handler = login(issuer("https://auth.example.com"));
        let mut ctx = RequestContext::new();
        ctx.set_issuer_origin("http://sts:80");

        let response = handler(ctx, request("/account/login")).await;
        assert_eq!(
            response.headers()[header::LOCATION],
            "http://sts:80/connect/authorize/callback"
        );
    }

    #[tokio::test]
    async fn test_home_serves_html() {
        let response = home(RequestContext::new(), request("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }
}
