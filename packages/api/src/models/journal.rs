use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::null_as_default;

pub const JOURNAL_TABLE: &str = "journal_entries";

/// Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub user_id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewJournalEntry {
    pub user_id: Uuid,
    pub content: String,
    pub mood: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewJournalEntry {
    pub fn new(user_id: Uuid, content: impl Into<String>, mood: Option<String>) -> Self {
        Self {
            user_id,
            content: content.into(),
            mood,
            created_at: Utc::now(),
        }
    }
}
