use uuid::Uuid;

use super::{decode_first, decode_rows, encode};
use crate::backend::{Backend, BackendError, Query};
use crate::models::{JournalEntry, NewJournalEntry, JOURNAL_TABLE};

pub async fn insert(
    backend: &dyn Backend,
    entry: &NewJournalEntry,
) -> Result<Option<JournalEntry>, BackendError> {
    let rows = backend.insert(JOURNAL_TABLE, vec![encode(entry)?]).await?;
    decode_first(rows)
}

/// A user's entries, newest first.
pub async fn recent(
    backend: &dyn Backend,
    user_id: Uuid,
    limit: usize,
) -> Result<Vec<JournalEntry>, BackendError> {
    let rows = backend
        .select(
            &Query::from(JOURNAL_TABLE)
                .eq("user_id", user_id.to_string())
                .order("created_at", false)
                .limit(limit),
        )
        .await?;
    decode_rows(rows)
}
