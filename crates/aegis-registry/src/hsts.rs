//! HSTS policy.

use std::time::Duration;

/// Strict-Transport-Security policy applied outside development.
///
/// The values are fixed, not configurable: preload, include subdomains,
/// max age 365 days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HstsPolicy {
    /// Whether the `preload` directive is emitted.
    pub preload: bool,
    /// Whether the `includeSubDomains` directive is emitted.
    pub include_subdomains: bool,
    /// The `max-age` directive value.
    pub max_age: Duration,
}

impl HstsPolicy {
    /// The fixed policy this host registers.
    #[must_use]
    pub fn fixed() -> Self {
        Self {
            preload: true,
            include_subdomains: true,
            max_age: Duration::from_secs(365 * 24 * 60 * 60),
        }
    }

    /// Renders the `Strict-Transport-Security` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        let mut value = format!("max-age={}", self.max_age.as_secs());
        if self.include_subdomains {
            value.push_str("; includeSubDomains");
        }
        if self.preload {
            value.push_str("; preload");
        }
        value
    }
}

impl Default for HstsPolicy {
    fn default() -> Self {
        Self::fixed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_policy_header() {
        assert_eq!(
            HstsPolicy::fixed().header_value(),
            "max-age=31536000; includeSubDomains; preload"
        );
    }

    #[test]
    fn test_directives_follow_flags() {
        let policy = HstsPolicy {
            preload: false,
            include_subdomains: false,
            max_age: Duration::from_secs(60),
        };
        assert_eq!(policy.header_value(), "max-age=60");
    }
}
