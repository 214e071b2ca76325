//! Backend connection settings.

use store::SiteConfig;

use crate::error::AuthError;

/// URL and key for one backend project. Either may be missing; the client
/// wrapper then falls back to the unavailable backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub key: Option<String>,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            key: Some(key.into()),
        }
    }

    /// Public URL and anonymous key from `SUPABASE_URL` / `SUPABASE_ANON_KEY`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            url: non_empty(std::env::var("SUPABASE_URL").ok()),
            key: non_empty(std::env::var("SUPABASE_ANON_KEY").ok()),
        }
    }

    /// The pair shipped in the site configuration.
    pub fn from_site(site: &SiteConfig) -> Self {
        Self {
            url: non_empty(site.backend.url.clone()),
            key: non_empty(site.backend.anon_key.clone()),
        }
    }

    /// Privileged pair used by the server handlers.
    pub fn service(url: Option<String>, service_key: Option<String>) -> Self {
        Self {
            url: non_empty(url),
            key: non_empty(service_key),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.url.is_some() && self.key.is_some()
    }

    /// Both values, or `ConfigurationMissing` naming the first one absent.
    pub fn require(&self) -> Result<(&str, &str), AuthError> {
        let url = self
            .url
            .as_deref()
            .ok_or(AuthError::ConfigurationMissing("SUPABASE_URL"))?;
        let key = self
            .key
            .as_deref()
            .ok_or(AuthError::ConfigurationMissing("backend key"))?;
        Ok((url, key))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
