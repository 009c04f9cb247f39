//! Localization wiring for the view layer.

use serde::Deserialize;

use crate::auth::IdentityShape;

/// Well-known section key for [`LocalizationConfiguration`].
pub const LOCALIZATION_SECTION: &str = "localization";

/// Localization settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalizationConfiguration {
    /// Supported culture tags, first match wins during negotiation.
    pub cultures: Vec<String>,
    /// Fallback culture when negotiation finds no match.
    pub default_culture: String,
}

impl Default for LocalizationConfiguration {
    fn default() -> Self {
        Self {
            cultures: vec!["en".to_string()],
            default_culture: "en".to_string(),
        }
    }
}

/// Culture negotiation service registered at startup.
///
/// Parameterized by the same user/role shape as the authentication
/// wiring, since localized views render against that identity model.
#[derive(Debug)]
pub struct Localization {
    cultures: Vec<String>,
    default_culture: String,
    user_shape: &'static str,
    role_shape: &'static str,
}

impl Localization {
    /// Creates the service bound to a user/role shape.
    #[must_use]
    pub fn bound<U: IdentityShape, R: IdentityShape>(config: &LocalizationConfiguration) -> Self {
        Self {
            cultures: config.cultures.clone(),
            default_culture: config.default_culture.clone(),
            user_shape: U::NAME,
            role_shape: R::NAME,
        }
    }

    /// Supported culture tags.
    #[must_use]
    pub fn cultures(&self) -> &[String] {
        &self.cultures
    }

    /// The fallback culture.
    #[must_use]
    pub fn default_culture(&self) -> &str {
        &self.default_culture
    }

    /// The user shape this service renders against.
    #[must_use]
    pub fn user_shape(&self) -> &'static str {
        self.user_shape
    }

    /// The role shape this service renders against.
    #[must_use]
    pub fn role_shape(&self) -> &'static str {
        self.role_shape
    }

    /// Negotiates a culture from an `Accept-Language` header value.
    ///
    /// Walks the header in order, matching full tags first and then the
    /// primary subtag (`de-CH` matches a supported `de`). Falls back to
    /// the default culture.
    #[must_use]
    pub fn negotiate(&self, accept_language: Option<&str>) -> String {
        let Some(header) = accept_language else {
            return self.default_culture.clone();
        };

        for entry in header.split(',') {
            let tag = entry.split(';').next().unwrap_or("").trim();
            if tag.is_empty() || tag == "*" {
                continue;
            }

            if let Some(culture) = self.cultures.iter().find(|c| c.eq_ignore_ascii_case(tag)) {
                return culture.clone();
            }

            let primary = tag.split('-').next().unwrap_or(tag);
            if let Some(culture) = self
                .cultures
                .iter()
                .find(|c| c.eq_ignore_ascii_case(primary))
            {
                return culture.clone();
            }
        }

        self.default_culture.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{StandardRole, StandardUser};

    fn localization(cultures: &[&str], default: &str) -> Localization {
        Localization::bound::<StandardUser, StandardRole>(&LocalizationConfiguration {
            cultures: cultures.iter().map(|s| (*s).to_string()).collect(),
            default_culture: default.to_string(),
        })
    }

    #[test]
    fn test_no_header_falls_back() {
        let l = localization(&["en", "de"], "en");
        assert_eq!(l.negotiate(None), "en");
    }

    #[test]
    fn test_exact_match() {
        let l = localization(&["en", "de"], "en");
        assert_eq!(l.negotiate(Some("de, en;q=0.8")), "de");
    }

    #[test]
    fn test_primary_subtag_match() {
        let l = localization(&["en", "de"], "en");
        assert_eq!(l.negotiate(Some("de-CH")), "de");
    }

    #[test]
    fn test_unsupported_falls_back() {
        let l = localization(&["en"], "en");
        assert_eq!(l.negotiate(Some("fr, it;q=0.5")), "en");
    }

    #[test]
    fn test_wildcard_skipped() {
        let l = localization(&["en", "sv"], "en");
        assert_eq!(l.negotiate(Some("*, sv")), "sv");
    }
}
