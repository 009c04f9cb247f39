//! Service container.
//!
//! A simple type-keyed container for the capability set. Services are
//! registered once at startup and resolved by type afterwards; the
//! container is never mutated once the process starts accepting requests,
//! so sharing it across request tasks needs no synchronization.
//!
//! # Example
//!
//! ```
//! use aegis_registry::ServiceContainer;
//! use std::sync::Arc;
//!
//! struct Clock;
//!
//! let mut container = ServiceContainer::new();
//! container.register(Arc::new(Clock));
//!
//! let clock: Arc<Clock> = container.resolve().unwrap();
//! # let _ = clock;
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RegistryError;

/// A type-keyed service container.
///
/// Stores `Arc`-wrapped services keyed by their type. `Send + Sync` so it
/// can be shared across request-handling tasks once registration is done.
#[derive(Default)]
pub struct ServiceContainer {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ServiceContainer {
    /// Creates a new empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Registers a service, replacing any previous registration of the
    /// same type.
    pub fn register<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), service);
    }

    /// Resolves a service, or `None` if it was never registered.
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| s.clone().downcast::<T>().ok())
    }

    /// Resolves a service that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ServiceNotRegistered`] when the service
    /// is absent; during startup this is fatal.
    pub fn expect<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, RegistryError> {
        self.resolve().ok_or(RegistryError::ServiceNotRegistered {
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Whether a service of the given type is registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the container is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl std::fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("services", &self.services.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Greeter {
        greeting: String,
    }

    #[test]
    fn test_register_and_resolve() {
        let mut container = ServiceContainer::new();
        container.register(Arc::new(Greeter {
            greeting: "hello".to_string(),
        }));

        let greeter: Arc<Greeter> = container.resolve().unwrap();
        assert_eq!(greeter.greeting, "hello");
        assert!(container.contains::<Greeter>());
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_resolve_missing_returns_none() {
        let container = ServiceContainer::new();
        assert!(container.resolve::<Greeter>().is_none());
        assert!(container.is_empty());
    }

    #[test]
    fn test_expect_missing_is_error() {
        let container = ServiceContainer::new();
        let err = container.expect::<Greeter>().unwrap_err();
        assert!(err.to_string().contains("Greeter"));
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut container = ServiceContainer::new();
        container.register(Arc::new(Greeter {
            greeting: "first".to_string(),
        }));
        container.register(Arc::new(Greeter {
            greeting: "second".to_string(),
        }));

        let greeter: Arc<Greeter> = container.resolve().unwrap();
        assert_eq!(greeter.greeting, "second");
        assert_eq!(container.len(), 1);
    }
}
