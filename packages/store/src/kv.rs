//! Persisted string key/value storage.
//!
//! Mirrors browser local storage: synchronous, string-keyed, string-valued, and
//! allowed to silently drop writes it cannot persist.

/// Well-known key holding the chosen language code.
pub const LANGUAGE_KEY: &str = "language";

/// Key under which the translation table for `lang` is cached.
pub fn translations_key(lang: &str) -> String {
    format!("translations_{lang}")
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}
