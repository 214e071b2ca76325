//! # Filesystem-backed key/value store
//!
//! [`FileStore`] persists each key as its own file so that language choice and
//! cached translation tables survive restarts on native hosts.
//!
//! ```text
//! <base_dir>/
//! ├── language              # "en"
//! └── translations_ar       # cached JSON table
//! ```
//!
//! Keys are restricted to `[A-Za-z0-9_-]`; anything else is replaced with `_`
//! so a key can never escape the base directory.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::kv::KeyValueStore;

#[derive(Clone, Debug)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base.join(name)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.entry_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.base) {
            warn!("Failed to create store directory {}: {}", self.base.display(), e);
            return;
        }
        if let Err(e) = std::fs::write(self.entry_path(key), value) {
            warn!("Failed to persist {}: {}", key, e);
        }
    }

    fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.entry_path(key));
    }
}
