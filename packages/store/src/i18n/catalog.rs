//! Translation tables.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::StoreError;

const EMBEDDED_EN: &str = include_str!("../../translations/en.json");
const EMBEDDED_AR: &str = include_str!("../../translations/ar.json");

/// A flat key → string table for one language.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(HashMap<String, String>);

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table compiled into the binary, or an empty table for languages
    /// that only exist as network overlays.
    pub fn embedded(lang: &str) -> Self {
        let source = match lang {
            "en" => EMBEDDED_EN,
            "ar" => EMBEDDED_AR,
            _ => return Self::default(),
        };
        Self::from_json(source).unwrap_or_else(|e| {
            warn!("Embedded {} translations are invalid: {}", lang, e);
            Self::default()
        })
    }

    pub fn from_json(s: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Layer `overlay` on top of this table; overlay entries win.
    pub fn merged(mut self, overlay: Catalog) -> Self {
        self.0.extend(overlay.0);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl FromIterator<(String, String)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
