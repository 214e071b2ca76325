//! # Backend-as-a-service seam
//!
//! Every data and identity operation in Atlantis is a single call into a hosted
//! service that provides managed auth plus row-level access to a handful of
//! relational tables. This module defines that service as a capability:
//!
//! - [`AuthClient`]: sessions, sign-up/in/out, password flows, session-change
//!   notifications, and the privileged user-admin calls the HTTP handlers need.
//! - [`TableClient`]: `select`/`insert`/`update` driven by a [`Query`].
//! - [`Backend`]: both of the above, held as `Arc<dyn Backend>`.
//!
//! ## Implementations
//!
//! | Type | Used for |
//! |------|----------|
//! | [`SupabaseBackend`] | The live hosted service over its REST endpoints |
//! | [`UnavailableBackend`] | Selected when configuration or the HTTP stack is missing; every call fails with [`BackendError::Unavailable`] |
//! | [`MemoryBackend`] | Tests and local development; enforces unique ids and row-level policy in memory |

mod memory;
mod query;
mod supabase;
mod unavailable;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

pub use memory::MemoryBackend;
pub use query::{Order, Query};
pub use supabase::SupabaseBackend;
pub use unavailable::UnavailableBackend;

/// Postgres SQLSTATE for a unique constraint violation.
pub const DUPLICATE_KEY: &str = "23505";
/// Postgres SQLSTATE raised when a row-level policy rejects a statement.
pub const POLICY_VIOLATION: &str = "42501";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend service is not available")]
    Unavailable,

    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn api(status: u16, code: Option<&str>, message: impl Into<String>) -> Self {
        BackendError::Api {
            status,
            code: code.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            BackendError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            BackendError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_duplicate_key(&self) -> bool {
        self.code() == Some(DUPLICATE_KEY)
    }

    pub fn is_policy_violation(&self) -> bool {
        self.code() == Some(POLICY_VIOLATION)
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError::Decode(e.to_string())
    }
}

/// The auth service's identity record (distinct from the profile row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
    #[serde(default)]
    pub identities: Option<Vec<Value>>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

impl AuthUser {
    /// Display name supplied at sign-up, if any.
    pub fn display_name(&self) -> Option<&str> {
        self.user_metadata
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// The auth service hides existing accounts behind a user with no identities.
    pub fn is_obfuscated(&self) -> bool {
        matches!(&self.identities, Some(ids) if ids.is_empty())
    }
}

/// A bearer-token-backed proof of authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now.timestamp())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// Pushed by the backend whenever the held session changes.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    /// Stored as the new user's metadata.
    pub data: Value,
    pub email_redirect_to: Option<String>,
}

/// A session is only present when the service confirms e-mail addresses automatically.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignUpResponse {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
}

/// Privileged user creation, bypassing self-service sign-up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminUserRequest {
    pub email: String,
    pub password: String,
    pub email_confirm: bool,
    pub user_metadata: Value,
}

#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn get_session(&self) -> Result<Option<Session>, BackendError>;
    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpResponse, BackendError>;
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError>;
    async fn sign_out(&self) -> Result<(), BackendError>;
    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), BackendError>;
    async fn update_password(&self, password: &str) -> Result<AuthUser, BackendError>;

    /// Session-change notifications, delivered at unspecified times.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;

    /// Resolve a bearer token to its user. Privileged.
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError>;
    async fn admin_create_user(&self, request: AdminUserRequest) -> Result<AuthUser, BackendError>;
    async fn admin_delete_user(&self, id: Uuid) -> Result<(), BackendError>;
}

#[async_trait]
pub trait TableClient: Send + Sync {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, BackendError>;
    /// Returns the inserted rows as stored.
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, BackendError>;
    /// Applies `patch` to every row matching the query's filters.
    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, BackendError>;
}

pub trait Backend: AuthClient + TableClient {}

impl<T: AuthClient + TableClient + ?Sized> Backend for T {}
