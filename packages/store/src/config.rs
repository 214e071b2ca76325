//! # Site configuration: `atlantis.toml`
//!
//! The public half of the deployment configuration, shipped with the client
//! bundle. It never carries privileged keys: the anonymous key is meant to be
//! public and row-level policies on the backend do the actual gatekeeping.
//!
//! ```toml
//! [backend]
//! url = "https://project.supabase.co"
//! anon_key = "eyJ..."
//!
//! [i18n]
//! default_language = "en"
//! rtl_languages = ["ar"]
//! translations_url = "/translations"
//!
//! [auth]
//! site_url = "http://localhost:8888"
//! ```
//!
//! Every section is defaulted, so a missing or empty file yields a usable
//! configuration with no backend (which selects the unavailable backend).

use serde::{Deserialize, Serialize};

use crate::StoreError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub i18n: I18nSection,
    #[serde(default)]
    pub auth: AuthSection,
}

/// Public connection details for the hosted backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendSection {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub anon_key: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct I18nSection {
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Languages rendered right-to-left.
    #[serde(default = "default_rtl_languages")]
    pub rtl_languages: Vec<String>,
    /// Base URL for `<lang>.json` overlays. None disables the network overlay.
    #[serde(default)]
    pub translations_url: Option<String>,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_rtl_languages() -> Vec<String> {
    vec!["ar".to_string()]
}

impl Default for I18nSection {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            rtl_languages: default_rtl_languages(),
            translations_url: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthSection {
    /// Origin used to build e-mail confirmation and password reset links.
    #[serde(default = "default_site_url")]
    pub site_url: String,
}

fn default_site_url() -> String {
    "http://localhost:8888".to_string()
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
        }
    }
}

impl SiteConfig {
    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "atlantis.toml"
    }

    pub fn from_toml(s: &str) -> Result<Self, StoreError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml(&self) -> Result<String, StoreError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Builder method to point at a backend project.
    pub fn with_backend(mut self, url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        self.backend.url = Some(url.into());
        self.backend.anon_key = Some(anon_key.into());
        self
    }

    pub fn is_rtl(&self, lang: &str) -> bool {
        self.i18n.rtl_languages.iter().any(|l| l == lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = SiteConfig::from_toml("").unwrap();
        assert_eq!(config, SiteConfig::default());
        assert_eq!(config.i18n.default_language, "en");
        assert!(config.is_rtl("ar"));
        assert!(!config.is_rtl("en"));
        assert!(config.backend.url.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config = SiteConfig::from_toml(
            r#"
            [backend]
            url = "https://example.supabase.co"

            [i18n]
            translations_url = "/translations"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.url.as_deref(), Some("https://example.supabase.co"));
        assert!(config.backend.anon_key.is_none());
        assert_eq!(config.i18n.translations_url.as_deref(), Some("/translations"));
        assert_eq!(config.i18n.rtl_languages, vec!["ar".to_string()]);
        assert_eq!(config.auth.site_url, "http://localhost:8888");
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = SiteConfig::default().with_backend("https://a.supabase.co", "anon");
        let text = config.to_toml().unwrap();
        assert_eq!(SiteConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(matches!(
            SiteConfig::from_toml("[backend]\nurl = 3"),
            Err(StoreError::Config(_))
        ));
    }
}
