use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{decode_first, decode_rows, encode};
use crate::backend::{Backend, BackendError, Query};
use crate::models::{NewProfile, Profile, Role, StatField, UserStats, USERS_TABLE};

pub async fn find(backend: &dyn Backend, id: Uuid) -> Result<Option<Profile>, BackendError> {
    let rows = backend
        .select(&Query::from(USERS_TABLE).eq("id", id.to_string()).limit(1))
        .await?;
    decode_first(rows)
}

/// Insert one profile row. Duplicate ids surface as a `23505` error.
pub async fn insert(backend: &dyn Backend, row: &NewProfile) -> Result<Profile, BackendError> {
    let inserted = backend.insert(USERS_TABLE, vec![encode(row)?]).await?;
    Ok(decode_first(inserted)?.unwrap_or_else(|| row.clone().into_profile()))
}

/// Role column only; `None` when the user has no profile row.
pub async fn role(backend: &dyn Backend, id: Uuid) -> Result<Option<Role>, BackendError> {
    let rows = backend
        .select(
            &Query::from(USERS_TABLE)
                .select("role")
                .eq("id", id.to_string())
                .limit(1),
        )
        .await?;
    let row: Option<RoleRow> = decode_first(rows)?;
    Ok(row.map(|r| r.role.unwrap_or_default()))
}

#[derive(Deserialize)]
struct RoleRow {
    #[serde(default)]
    role: Option<Role>,
}

pub async fn stats(backend: &dyn Backend, id: Uuid) -> Result<Option<UserStats>, BackendError> {
    let columns = StatField::ALL.map(StatField::column).join(",");
    let rows = backend
        .select(
            &Query::from(USERS_TABLE)
                .select(columns)
                .eq("id", id.to_string())
                .limit(1),
        )
        .await?;
    decode_first(rows)
}

/// Newest profiles first.
pub async fn list(backend: &dyn Backend, limit: usize) -> Result<Vec<Profile>, BackendError> {
    let rows = backend
        .select(
            &Query::from(USERS_TABLE)
                .order("created_at", false)
                .limit(limit),
        )
        .await?;
    decode_rows(rows)
}

/// Read the counter, then write back `count + 1`. Two round trips, so
/// concurrent increments for one user can lose updates. Returns the new value,
/// or `None` when the profile row does not exist.
pub async fn increment_stat(
    backend: &dyn Backend,
    id: Uuid,
    field: StatField,
) -> Result<Option<i64>, BackendError> {
    let column = field.column();
    let rows = backend
        .select(
            &Query::from(USERS_TABLE)
                .select(column)
                .eq("id", id.to_string())
                .limit(1),
        )
        .await?;
    let Some(row) = rows.first() else {
        return Ok(None);
    };

    let next = row.get(column).and_then(Value::as_i64).unwrap_or(0) + 1;
    let mut patch = Map::new();
    patch.insert(column.to_string(), next.into());
    backend
        .update(
            &Query::from(USERS_TABLE).eq("id", id.to_string()),
            Value::Object(patch),
        )
        .await?;
    Ok(Some(next))
}
