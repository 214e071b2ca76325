use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::null_as_default;

pub const CONTENT_TABLE: &str = "content";

pub const DEFAULT_CONTENT_TYPE: &str = "article";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub user_id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(rename = "type", default = "default_type", deserialize_with = "type_or_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub published: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert shape for the content endpoint. `type` defaults to `article` and
/// `published` to false.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewContent {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl NewContent {
    pub fn new(
        user_id: Uuid,
        title: impl Into<String>,
        content: impl Into<String>,
        kind: Option<String>,
        published: Option<bool>,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            content: content.into(),
            kind: kind
                .filter(|k| !k.trim().is_empty())
                .unwrap_or_else(default_type),
            published: published.unwrap_or(false),
            created_at: Utc::now(),
        }
    }
}

fn default_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

fn type_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_type))
}
