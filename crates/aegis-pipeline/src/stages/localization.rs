//! Localization stage.

use std::sync::Arc;

use http::header::{ACCEPT_LANGUAGE, CONTENT_LANGUAGE};
use http::HeaderValue;

use aegis_registry::Localization;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Negotiates the request culture and stamps `Content-Language`.
#[derive(Debug)]
pub struct LocalizationStage {
    localization: Arc<Localization>,
}

impl LocalizationStage {
    /// Creates the stage over the registered localization service.
    #[must_use]
    pub fn new(localization: Arc<Localization>) -> Self {
        Self { localization }
    }
}

impl Middleware for LocalizationStage {
    fn name(&self) -> &'static str {
        "localization"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let accept = request
                .headers()
                .get(ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let locale = self.localization.negotiate(accept.as_deref());
            ctx.set_locale(locale.clone());

            let mut response = next.run(ctx, request).await;

            if !response.headers().contains_key(CONTENT_LANGUAGE) {
                if let Ok(value) = HeaderValue::from_str(&locale) {
                    response.headers_mut().insert(CONTENT_LANGUAGE, value);
                }
            }

            response
        })
    }
}
