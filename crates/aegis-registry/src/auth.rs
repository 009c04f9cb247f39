//! Authentication and token-issuance capability handles.
//!
//! The protocol engine itself (credential checks, token minting, consent)
//! is an external collaborator; what the host needs is a registerable,
//! invocable capability bound to a specific user/role shape and to the
//! persistence stores. That binding is what lives here.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::persistence::{ConfigurationStore, GrantStore, IdentityStore};

/// Marker for the user/role shape a capability is bound to.
///
/// The shape carries no behavior; it pins the identity model the
/// authentication and localization wiring is parameterized by, the way a
/// host picks its user entity once and threads it everywhere.
pub trait IdentityShape: Send + Sync + 'static {
    /// Shape name, used in logs.
    const NAME: &'static str;
}

/// The default user shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardUser;

impl IdentityShape for StandardUser {
    const NAME: &'static str = "StandardUser";
}

/// The default role shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRole;

impl IdentityShape for StandardRole {
    const NAME: &'static str = "StandardRole";
}

/// An authenticated subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Stable subject identifier.
    pub id: String,
    /// Username for display and logging.
    pub username: String,
    /// Role memberships.
    pub roles: Vec<String>,
}

impl Subject {
    /// Creates a subject with no roles.
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            roles: Vec::new(),
        }
    }

    /// Adds a role membership.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Whether the subject holds the given role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// The caller identity resolved by the authentication stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    /// No credentials presented, or credentials unknown to this process.
    #[default]
    Anonymous,
    /// An authenticated subject.
    Subject(Subject),
}

impl Identity {
    /// Whether a subject was authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Subject(_))
    }

    /// Whether the identity holds the given role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        match self {
            Self::Anonymous => false,
            Self::Subject(subject) => subject.has_role(role),
        }
    }
}

/// Name of the session cookie the authentication stage reads.
pub const SESSION_COOKIE: &str = "aegis_session";

/// Identity/credential management bound to the identity store.
///
/// Resolution of a session token to a subject is delegated to the store;
/// whether the backing record was produced by a password login, an
/// external provider, or a seeded staging fixture is not this host's
/// concern.
#[derive(Debug)]
pub struct AuthenticationService {
    identity_store: Arc<IdentityStore>,
    user_shape: &'static str,
    role_shape: &'static str,
}

impl AuthenticationService {
    /// Creates the service bound to a user/role shape.
    #[must_use]
    pub fn bound<U: IdentityShape, R: IdentityShape>(identity_store: Arc<IdentityStore>) -> Self {
        Self {
            identity_store,
            user_shape: U::NAME,
            role_shape: R::NAME,
        }
    }

    /// Resolves a session token to a caller identity.
    ///
    /// `None` or an unknown token resolves to [`Identity::Anonymous`];
    /// authentication never fails a request by itself.
    #[must_use]
    pub fn authenticate(&self, session_token: Option<&str>) -> Identity {
        session_token
            .and_then(|token| self.identity_store.resolve_session(token))
            .map_or(Identity::Anonymous, Identity::Subject)
    }

    /// The user shape this service was bound with.
    #[must_use]
    pub fn user_shape(&self) -> &'static str {
        self.user_shape
    }

    /// The role shape this service was bound with.
    #[must_use]
    pub fn role_shape(&self) -> &'static str {
        self.role_shape
    }

    /// The identity store backing this service.
    #[must_use]
    pub fn identity_store(&self) -> &Arc<IdentityStore> {
        &self.identity_store
    }
}

/// Token-issuance capability bound to the configuration and grant stores.
///
/// Endpoint handlers use it to build absolute protocol URLs on the
/// externally perceived origin; the perceived origin can be overridden
/// per request by the redirect-rewrite stage.
#[derive(Debug)]
pub struct TokenIssuer<U: IdentityShape = StandardUser> {
    configuration_store: Arc<ConfigurationStore>,
    grant_store: Arc<GrantStore>,
    issuer_uri: String,
    _shape: PhantomData<U>,
}

impl<U: IdentityShape> TokenIssuer<U> {
    /// Creates the issuer over its stores.
    #[must_use]
    pub fn new(
        configuration_store: Arc<ConfigurationStore>,
        grant_store: Arc<GrantStore>,
        issuer_uri: impl Into<String>,
    ) -> Self {
        Self {
            configuration_store,
            grant_store,
            issuer_uri: issuer_uri.into(),
            _shape: PhantomData,
        }
    }

    /// The configured issuer origin; may be blank when unadvertised.
    #[must_use]
    pub fn issuer_uri(&self) -> &str {
        &self.issuer_uri
    }

    /// Builds an absolute URL on the perceived origin.
    ///
    /// The per-request origin override (set by the redirect-rewrite
    /// stage) wins over the configured issuer; with neither, the path is
    /// returned as-is.
    #[must_use]
    pub fn absolute_url(&self, origin_override: Option<&str>, path: &str) -> String {
        let origin = origin_override
            .filter(|o| !o.trim().is_empty())
            .unwrap_or(&self.issuer_uri);
        if origin.trim().is_empty() {
            path.to_string()
        } else {
            format!("{}{}", origin.trim_end_matches('/'), path)
        }
    }

    /// The configuration store backing this issuer.
    #[must_use]
    pub fn configuration_store(&self) -> &Arc<ConfigurationStore> {
        &self.configuration_store
    }

    /// The grant store backing this issuer.
    #[must_use]
    pub fn grant_store(&self) -> &Arc<GrantStore> {
        &self.grant_store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::StoreBackend;

    fn in_memory_issuer(issuer: &str) -> TokenIssuer {
        TokenIssuer::new(
            Arc::new(ConfigurationStore::new(StoreBackend::InMemory)),
            Arc::new(GrantStore::new(StoreBackend::InMemory)),
            issuer,
        )
    }

    #[test]
    fn test_anonymous_without_token() {
        let store = Arc::new(IdentityStore::new(StoreBackend::InMemory));
        let service = AuthenticationService::bound::<StandardUser, StandardRole>(store);

        assert_eq!(service.authenticate(None), Identity::Anonymous);
        assert_eq!(service.authenticate(Some("unknown")), Identity::Anonymous);
    }

    #[test]
    fn test_known_session_resolves_subject() {
        let store = Arc::new(IdentityStore::new(StoreBackend::InMemory));
        store.insert_session("tok", Subject::new("u-1", "alice").with_role("Operators"));

        let service =
            AuthenticationService::bound::<StandardUser, StandardRole>(Arc::clone(&store));
        let identity = service.authenticate(Some("tok"));

        assert!(identity.is_authenticated());
        assert!(identity.has_role("Operators"));
        assert!(!identity.has_role("Other"));
    }

    #[test]
    fn test_shape_names_recorded() {
        let store = Arc::new(IdentityStore::new(StoreBackend::InMemory));
        let service = AuthenticationService::bound::<StandardUser, StandardRole>(store);
        assert_eq!(service.user_shape(), "StandardUser");
        assert_eq!(service.role_shape(), "StandardRole");
    }

    #[test]
    fn test_absolute_url_uses_configured_issuer() {
        let issuer = in_memory_issuer("https://auth.example.com/");
        assert_eq!(
            issuer.absolute_url(None, "/connect/authorize"),
            "https://auth.example.com/connect/authorize"
        );
    }

    #[test]
    fn test_absolute_url_override_wins() {
        let issuer = in_memory_issuer("https://auth.example.com");
        assert_eq!(
            issuer.absolute_url(Some("http://sts:80"), "/connect/token"),
            "http://sts:80/connect/token"
        );
    }

    #[test]
    fn test_absolute_url_without_origin_is_relative() {
        let issuer = in_memory_issuer("");
        assert_eq!(issuer.absolute_url(None, "/connect/token"), "/connect/token");
    }
}
