//! HTTP server hosting the pipeline.
//!
//! Hyper/Tokio serve loop: one task per connection, the pipeline invoked
//! once per request. A dropped connection cancels the request future
//! mid-chain, which unwinds every stage without completing the response
//! write.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpListener;

use aegis_pipeline::{Pipeline, Request, Response, ResponseExt};

use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Default graceful shutdown drain timeout.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Server errors.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The listener could not bind.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The requested address.
        addr: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// The host HTTP server.
pub struct Server {
    addr: String,
    pipeline: Arc<Pipeline>,
    shutdown_timeout: Duration,
}

impl Server {
    /// Creates a server for the assembled pipeline.
    #[must_use]
    pub fn new(addr: impl Into<String>, pipeline: Pipeline) -> Self {
        Self {
            addr: addr.into(),
            pipeline: Arc::new(pipeline),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Overrides the graceful shutdown drain timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// The configured bind address.
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Runs until SIGINT.
    ///
    /// # Errors
    ///
    /// Fails when the listener cannot bind.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Runs with a caller-controlled shutdown signal.
    ///
    /// # Errors
    ///
    /// Fails when the listener cannot bind.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.addr).await.map_err(|source| {
            ServerError::Bind {
                addr: self.addr.clone(),
                source,
            }
        })?;

        tracing::info!(addr = %self.addr, "listening");

        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, remote_addr)) => {
                            let pipeline = Arc::clone(&self.pipeline);
                            let connection_shutdown = shutdown.clone();
                            let token = tracker.acquire();
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |request: http::Request<Incoming>| {
                                    let pipeline = Arc::clone(&pipeline);
                                    async move { Ok::<_, Infallible>(handle(pipeline, request).await) }
                                });

                                let conn = http1::Builder::new().serve_connection(io, service);
                                tokio::select! {
                                    result = conn => {
                                        if let Err(error) = result {
                                            tracing::debug!(%remote_addr, %error, "connection closed with error");
                                        }
                                    }
                                    () = connection_shutdown.recv() => {
                                        tracing::debug!(%remote_addr, "connection aborted by shutdown");
                                    }
                                }
                                drop(token);
                            });
                        }
                        Err(error) => {
                            tracing::error!(%error, "accept failed");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received");
                    break;
                }
            }
        }

        tokio::select! {
            () = tracker.wait_idle() => {
                tracing::info!("all connections closed");
            }
            () = tokio::time::sleep(self.shutdown_timeout) => {
                tracing::warn!(
                    active = tracker.active_connections(),
                    "shutdown timeout reached with connections still active"
                );
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }
}

/// Collects the request body and runs one request through the pipeline.
async fn handle(pipeline: Arc<Pipeline>, request: http::Request<Incoming>) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(error) => {
            tracing::warn!(%error, "failed to read request body");
            return Response::error(StatusCode::BAD_REQUEST, "bad request");
        }
    };

    let request = Request::from_parts(parts, Full::new(bytes));
    pipeline.handle(request).await
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("addr", &self.addr)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}
