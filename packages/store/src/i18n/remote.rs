//! Network overlays for translation tables.

use std::future::Future;

use crate::config::I18nSection;
use crate::i18n::Catalog;
use crate::StoreError;

/// Async source of per-language translation overlays.
pub trait TranslationSource {
    /// `Ok(None)` means the source has nothing for `lang`.
    fn fetch(&self, lang: &str) -> impl Future<Output = Result<Option<Catalog>, StoreError>>;
}

/// Source used when no overlay URL is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOverlay;

impl TranslationSource for NoOverlay {
    async fn fetch(&self, _lang: &str) -> Result<Option<Catalog>, StoreError> {
        Ok(None)
    }
}

/// Fetches `<base_url>/<lang>.json`.
#[derive(Clone, Debug)]
pub struct HttpTranslations {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTranslations {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `None` when the section has no overlay URL.
    pub fn from_config(config: &I18nSection) -> Option<Self> {
        config
            .translations_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(Self::new)
    }

    pub fn url_for(&self, lang: &str) -> String {
        format!("{}/{}.json", self.base_url, lang)
    }
}

impl TranslationSource for HttpTranslations {
    async fn fetch(&self, lang: &str) -> Result<Option<Catalog>, StoreError> {
        let response = self.client.get(self.url_for(lang)).send().await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let body = response.text().await?;
        Ok(Some(Catalog::from_json(&body)?))
    }
}

impl<T: TranslationSource> TranslationSource for Option<T> {
    async fn fetch(&self, lang: &str) -> Result<Option<Catalog>, StoreError> {
        match self {
            Some(source) => source.fetch(lang).await,
            None => Ok(None),
        }
    }
}

/// Fixed overlays, for tests and hosts that bundle extra languages.
#[derive(Clone, Debug, Default)]
pub struct StaticOverlay {
    tables: std::collections::HashMap<String, Catalog>,
}

impl StaticOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, lang: impl Into<String>, table: Catalog) -> Self {
        self.tables.insert(lang.into(), table);
        self
    }
}

impl TranslationSource for StaticOverlay {
    async fn fetch(&self, lang: &str) -> Result<Option<Catalog>, StoreError> {
        Ok(self.tables.get(lang).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_trims_trailing_slash() {
        let remote = HttpTranslations::new("https://atlantis.example/translations/");
        assert_eq!(
            remote.url_for("ar"),
            "https://atlantis.example/translations/ar.json"
        );
    }

    #[test]
    fn test_from_config_needs_a_url() {
        let mut section = I18nSection::default();
        assert!(HttpTranslations::from_config(&section).is_none());

        section.translations_url = Some("  ".into());
        assert!(HttpTranslations::from_config(&section).is_none());

        section.translations_url = Some("/translations".into());
        let remote = HttpTranslations::from_config(&section).unwrap();
        assert_eq!(remote.url_for("en"), "/translations/en.json");
    }
}
