//! Core middleware trait and chain types.
//!
//! A middleware stage receives the mutable [`RequestContext`], the
//! incoming request, and a [`Next`] callback for the remainder of the
//! chain. A stage that awaits `next` and then touches the response gets
//! sequential-then-unwind semantics: nothing it does to the response is
//! observable before the downstream chain has fully completed.
//!
//! # Example
//!
//! ```
//! use aegis_pipeline::{BoxFuture, Middleware, Next, Request, RequestContext, Response};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn handle<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let response = next.run(ctx, request).await;
//!             tracing::debug!(elapsed = ?ctx.started_at().elapsed(), "request done");
//!             response
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use crate::context::RequestContext;
use crate::types::{Request, Response};

/// A boxed future returned by middleware stages.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A middleware stage in the fixed-order chain.
///
/// # Invariants
///
/// - A stage calls `next.run()` exactly once, unless it short-circuits
///   with its own response.
/// - A stage never reorders or suppresses other stages.
pub trait Middleware: Send + Sync + 'static {
    /// Unique stage name, used for logging and order assertions.
    fn name(&self) -> &'static str;

    /// Processes the request through this stage.
    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// Callback invoking the remainder of the chain.
///
/// Consumed by `run`, so it can be called at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(Box<dyn FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'a>),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke the given stage.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates the terminal `Next` that invokes the endpoint handler.
    pub(crate) fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next stage or the endpoint handler.
    pub async fn run(self, ctx: &mut RequestContext, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.handle(ctx, request, *next).await,
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}
