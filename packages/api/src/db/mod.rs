//! # Table access
//!
//! Typed reads and writes against the backend's tables. Every function takes the
//! backend capability explicitly, so the same code runs under the browser's
//! anonymous-key client (row-level policy applies) and the server handlers'
//! service-role client.
//!
//! | Module | Table |
//! |--------|-------|
//! | [`profiles`] | `users`: profile rows, roles, practice counters |
//! | [`journal`] | `journal_entries` |
//! | [`content`] | `content` |

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backend::BackendError;

pub mod content;
pub mod journal;
pub mod profiles;

pub(crate) fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, BackendError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(BackendError::from))
        .collect()
}

pub(crate) fn decode_first<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>, BackendError> {
    rows.into_iter()
        .next()
        .map(serde_json::from_value)
        .transpose()
        .map_err(BackendError::from)
}

pub(crate) fn encode<T: serde::Serialize>(row: &T) -> Result<Value, BackendError> {
    serde_json::to_value(row).map_err(BackendError::from)
}
