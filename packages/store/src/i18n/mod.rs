//! # Internationalisation manager
//!
//! [`I18n`] owns the active language and its translation table. It is an
//! explicit context object: the host constructs one at start-up and hands it
//! (usually behind an `Arc`) to whatever needs translated strings.
//!
//! ## Loading a table
//!
//! 1. The key/value store's cached copy (`translations_<lang>`), if it parses.
//! 2. The network overlay from the [`TranslationSource`], layered over the
//!    embedded table and written back to the cache.
//! 3. The embedded table alone.
//!
//! Lookups never fail: a missing key degrades to the caller's fallback, and
//! then to the key itself.

mod catalog;
mod page;
pub mod remote;

use std::sync::RwLock;

use tracing::{debug, warn};

pub use catalog::Catalog;
pub use page::{Content, Direction, Element, ElementKind, LanguageButton, Page};
pub use remote::{HttpTranslations, NoOverlay, StaticOverlay, TranslationSource};

use crate::config::{I18nSection, SiteConfig};
use crate::kv::{translations_key, KeyValueStore, LANGUAGE_KEY};

/// String lookup with graceful degradation.
pub trait Translate {
    fn translate(&self, key: &str, fallback: &str) -> String;
}

fn lookup(table: &Catalog, key: &str, fallback: &str) -> String {
    match table.get(key) {
        Some(value) => value.to_string(),
        None if !fallback.is_empty() => fallback.to_string(),
        None => key.to_string(),
    }
}

impl Translate for Catalog {
    fn translate(&self, key: &str, fallback: &str) -> String {
        lookup(self, key, fallback)
    }
}

#[derive(Debug)]
struct Active {
    language: String,
    table: Catalog,
}

pub struct I18n<S, R = NoOverlay> {
    store: S,
    remote: R,
    rtl_languages: Vec<String>,
    active: RwLock<Active>,
}

impl<S: KeyValueStore, R: TranslationSource> I18n<S, R> {
    /// Restore the persisted language (or the configured default) and load
    /// its table.
    pub async fn new(store: S, remote: R, config: &I18nSection) -> Self {
        let language = store
            .get(LANGUAGE_KEY)
            .unwrap_or_else(|| config.default_language.clone());

        let manager = Self {
            store,
            remote,
            rtl_languages: config.rtl_languages.clone(),
            active: RwLock::new(Active {
                language: language.clone(),
                table: Catalog::new(),
            }),
        };

        let table = manager.load(&language).await;
        manager.active.write().unwrap().table = table;
        manager
    }

    pub fn language(&self) -> String {
        self.active.read().unwrap().language.clone()
    }

    pub fn direction(&self) -> Direction {
        self.direction_for(&self.language())
    }

    async fn load(&self, lang: &str) -> Catalog {
        let key = translations_key(lang);

        if let Some(cached) = self.store.get(&key) {
            match Catalog::from_json(&cached) {
                Ok(table) => return table,
                Err(e) => warn!("Discarding corrupt cached translations for {}: {}", lang, e),
            }
        }

        match self.remote.fetch(lang).await {
            Ok(Some(overlay)) => {
                let table = Catalog::embedded(lang).merged(overlay);
                match table.to_json() {
                    Ok(json) => self.store.set(&key, &json),
                    Err(e) => warn!("Failed to cache translations for {}: {}", lang, e),
                }
                table
            }
            Ok(None) => {
                debug!("No translation overlay for {}, using embedded table", lang);
                Catalog::embedded(lang)
            }
            Err(e) => {
                warn!("Failed to load translations for {}: {}", lang, e);
                Catalog::embedded(lang)
            }
        }
    }

    /// Repaint every tagged element, the text direction and the language
    /// switcher, then persist the active language.
    pub fn update_page(&self, page: &mut Page) {
        let active = self.active.read().unwrap();

        page.direction = self.direction_for(&active.language);

        for element in &mut page.elements {
            let translation = lookup(&active.table, &element.key, "");
            element.content = match element.kind {
                ElementKind::Input => Content::Placeholder(translation),
                ElementKind::Text if translation.contains("<a") => Content::Html(translation),
                ElementKind::Text => Content::Text(translation),
            };
        }

        for button in &mut page.language_buttons {
            button.active = button.lang == active.language;
        }

        self.store.set(LANGUAGE_KEY, &active.language);
    }

    fn direction_for(&self, lang: &str) -> Direction {
        if self.rtl_languages.iter().any(|l| l == lang) {
            Direction::Rtl
        } else {
            Direction::Ltr
        }
    }

    /// Switch languages. The cached table for `lang` is dropped so the
    /// overlay is fetched fresh, and `page` is repainted before returning.
    pub async fn change_language(&self, lang: &str, page: &mut Page) {
        self.store.set(LANGUAGE_KEY, lang);
        self.store.remove(&translations_key(lang));

        let table = self.load(lang).await;
        {
            let mut active = self.active.write().unwrap();
            active.language = lang.to_string();
            active.table = table;
        }

        self.update_page(page);
    }

    /// Add or replace a single string for `lang` in the cached table.
    pub fn add_translation(&self, lang: &str, key: &str, value: &str) {
        let cache_key = translations_key(lang);
        let mut table = self
            .store
            .get(&cache_key)
            .and_then(|cached| Catalog::from_json(&cached).ok())
            .unwrap_or_else(|| Catalog::embedded(lang));
        table.insert(key, value);

        match table.to_json() {
            Ok(json) => self.store.set(&cache_key, &json),
            Err(e) => warn!("Failed to cache translations for {}: {}", lang, e),
        }

        let mut active = self.active.write().unwrap();
        if active.language == lang {
            active.table.insert(key, value);
        }
    }
}

impl<S: KeyValueStore> I18n<S, Option<HttpTranslations>> {
    /// Manager for a deployed site: overlays come from `i18n.translations_url`
    /// when one is configured.
    pub async fn from_site(store: S, config: &SiteConfig) -> Self {
        let remote = HttpTranslations::from_config(&config.i18n);
        Self::new(store, remote, &config.i18n).await
    }
}

impl<S, R> Translate for I18n<S, R> {
    fn translate(&self, key: &str, fallback: &str) -> String {
        lookup(&self.active.read().unwrap().table, key, fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn page() -> Page {
        Page::new()
            .with_text("site_name")
            .with_text("guest_message")
            .with_input("journal_placeholder")
            .with_text("not_a_real_key")
            .with_language_button("en")
            .with_language_button("ar")
    }

    #[tokio::test]
    async fn test_defaults_to_configured_language() {
        let i18n = I18n::new(MemoryStore::new(), NoOverlay, &I18nSection::default()).await;
        assert_eq!(i18n.language(), "en");
        assert_eq!(i18n.direction(), Direction::Ltr);
        assert_eq!(i18n.translate("nav_home", ""), "Home");
    }

    #[tokio::test]
    async fn test_translate_degrades() {
        let i18n = I18n::new(MemoryStore::new(), NoOverlay, &I18nSection::default()).await;
        assert_eq!(i18n.translate("missing_key", "Fallback"), "Fallback");
        assert_eq!(i18n.translate("missing_key", ""), "missing_key");
    }

    #[tokio::test]
    async fn test_update_page_paints_every_tagged_element() {
        let store = MemoryStore::new();
        let i18n = I18n::new(store.clone(), NoOverlay, &I18nSection::default()).await;

        let mut page = page();
        i18n.update_page(&mut page);

        assert_eq!(page.direction, Direction::Ltr);
        assert_eq!(
            page.element("site_name").unwrap().content,
            Content::Text("Atlantis".into())
        );
        assert!(matches!(
            page.element("guest_message").unwrap().content,
            Content::Html(_)
        ));
        assert_eq!(
            page.element("journal_placeholder").unwrap().content,
            Content::Placeholder("Write your spiritual reflections here...".into())
        );
        assert_eq!(page.text_of("not_a_real_key"), Some("not_a_real_key"));
        assert_eq!(page.active_language(), Some("en"));
        assert_eq!(store.get(LANGUAGE_KEY).as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn test_change_language_repaints_and_persists() {
        let store = MemoryStore::new();
        let i18n = I18n::new(store.clone(), NoOverlay, &I18nSection::default()).await;

        let mut page = page();
        i18n.update_page(&mut page);
        i18n.change_language("ar", &mut page).await;

        assert_eq!(page.direction, Direction::Rtl);
        assert_eq!(page.text_of("site_name"), Some("أتلانتس"));
        assert_eq!(page.active_language(), Some("ar"));

        // A reload restores the choice.
        let reloaded = I18n::new(store, NoOverlay, &I18nSection::default()).await;
        assert_eq!(reloaded.language(), "ar");
        let mut fresh = Page::new().with_text("site_name");
        reloaded.update_page(&mut fresh);
        assert_eq!(fresh.direction, Direction::Rtl);
        assert_eq!(fresh.text_of("site_name"), Some("أتلانتس"));
    }

    #[tokio::test]
    async fn test_overlay_is_merged_and_cached() {
        let store = MemoryStore::new();
        let overlay: Catalog = [("hero_title".to_string(), "Find Peace".to_string())]
            .into_iter()
            .collect();
        let remote = StaticOverlay::new().with("en", overlay);

        let i18n = I18n::new(store.clone(), remote, &I18nSection::default()).await;

        assert_eq!(i18n.translate("hero_title", ""), "Find Peace");
        assert_eq!(i18n.translate("nav_home", ""), "Home");

        let cached = Catalog::from_json(&store.get("translations_en").unwrap()).unwrap();
        assert_eq!(cached.get("hero_title"), Some("Find Peace"));
    }

    #[tokio::test]
    async fn test_cached_table_wins_over_overlay() {
        let store = MemoryStore::new();
        store.set("translations_en", r#"{"nav_home":"Start"}"#);
        let remote = StaticOverlay::new().with(
            "en",
            [("nav_home".to_string(), "Overlay".to_string())].into_iter().collect(),
        );

        let i18n = I18n::new(store, remote, &I18nSection::default()).await;
        assert_eq!(i18n.translate("nav_home", ""), "Start");
    }

    #[tokio::test]
    async fn test_corrupt_cache_falls_back() {
        let store = MemoryStore::new();
        store.set("translations_en", "not json");

        let i18n = I18n::new(store, NoOverlay, &I18nSection::default()).await;
        assert_eq!(i18n.translate("nav_home", ""), "Home");
    }

    #[tokio::test]
    async fn test_add_translation_updates_active_table_and_cache() {
        let store = MemoryStore::new();
        let i18n = I18n::new(store.clone(), NoOverlay, &I18nSection::default()).await;

        i18n.add_translation("en", "nav_retreats", "Retreats");
        i18n.add_translation("fr", "nav_home", "Accueil");

        assert_eq!(i18n.translate("nav_retreats", ""), "Retreats");
        assert_eq!(i18n.translate("nav_home", ""), "Home");

        let fr = Catalog::from_json(&store.get("translations_fr").unwrap()).unwrap();
        assert_eq!(fr.get("nav_home"), Some("Accueil"));
    }

    #[tokio::test]
    async fn test_from_site_fetches_configured_overlay() {
        use axum::{extract::Path, routing::get, Router};

        let app = Router::new().route(
            "/translations/{file}",
            get(|Path(file): Path<String>| async move {
                if file == "ar.json" {
                    Ok(r#"{"site_name": "أتلانتس الجديدة", "overlay_only": "من الشبكة"}"#)
                } else {
                    Err(axum::http::StatusCode::NOT_FOUND)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let mut config = SiteConfig::default();
        config.i18n.default_language = "ar".into();
        config.i18n.translations_url = Some(format!("http://{addr}/translations/"));
        let store = MemoryStore::new();

        let i18n = I18n::from_site(store.clone(), &config).await;
        assert_eq!(i18n.direction(), Direction::Rtl);
        assert_eq!(i18n.translate("overlay_only", ""), "من الشبكة");
        assert_eq!(i18n.translate("site_name", ""), "أتلانتس الجديدة");
        assert_eq!(
            i18n.translate("nav_home", ""),
            Catalog::embedded("ar").translate("nav_home", "")
        );
        assert!(store.get(&translations_key("ar")).is_some());
    }

    #[tokio::test]
    async fn test_from_site_without_overlay_uses_embedded_table() {
        let i18n = I18n::from_site(MemoryStore::new(), &SiteConfig::default()).await;
        assert_eq!(i18n.translate("nav_home", ""), "Home");
    }
}
