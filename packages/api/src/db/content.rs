use super::{decode_first, decode_rows, encode};
use crate::backend::{Backend, BackendError, Query};
use crate::models::{ContentItem, NewContent, CONTENT_TABLE};

/// Published items, newest first.
pub async fn published(backend: &dyn Backend) -> Result<Vec<ContentItem>, BackendError> {
    let rows = backend
        .select(
            &Query::from(CONTENT_TABLE)
                .eq("published", true)
                .order("created_at", false),
        )
        .await?;
    decode_rows(rows)
}

pub async fn insert(backend: &dyn Backend, item: &NewContent) -> Result<ContentItem, BackendError> {
    let rows = backend.insert(CONTENT_TABLE, vec![encode(item)?]).await?;
    decode_first(rows)?.ok_or_else(|| BackendError::Decode("insert returned no rows".into()))
}
