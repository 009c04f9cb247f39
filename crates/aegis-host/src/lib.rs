//! Aegis STS host process.
//!
//! Wires configuration, capability registration, and the request
//! pipeline into one runnable identity-provider process:
//!
//! 1. [`Startup::new`] binds the configuration once.
//! 2. [`Startup::configure_services`] registers the capability set,
//!    choosing the persistence strategy by environment.
//! 3. [`Startup::build_pipeline`] assembles the fixed middleware chain.
//! 4. [`Server::run`] serves it until shutdown.
//!
//! Any failure in steps 1-3 is fatal; the listener never opens over a
//! partially wired process.

#![warn(missing_docs)]

pub mod controllers;
mod server;
mod shutdown;
mod startup;

pub use server::{Server, ServerError, DEFAULT_SHUTDOWN_TIMEOUT};
pub use shutdown::{ConnectionTracker, ConnectionToken, ShutdownSignal};
pub use startup::{Startup, StartupError};
