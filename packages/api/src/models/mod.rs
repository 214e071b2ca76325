//! Rows of the three backend tables this application reads and writes.

use serde::{Deserialize, Deserializer};

mod content;
mod journal;
mod user;

pub use content::{ContentItem, NewContent, CONTENT_TABLE, DEFAULT_CONTENT_TYPE};
pub use journal::{JournalEntry, NewJournalEntry, JOURNAL_TABLE};
pub use user::{
    avatar_color, initials, NewProfile, Profile, Role, StatField, UserStats, USERS_TABLE,
};

/// `#[serde(default)]` only covers a missing column; nullable columns also
/// come back as an explicit `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
