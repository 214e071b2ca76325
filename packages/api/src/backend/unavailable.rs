use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{
    AdminUserRequest, AuthChange, AuthClient, AuthUser, BackendError, Query, Session,
    SignUpRequest, SignUpResponse, TableClient,
};

/// Stand-in selected when the hosted service cannot be reached at all.
/// Every operation fails with [`BackendError::Unavailable`].
#[derive(Debug)]
pub struct UnavailableBackend {
    // Held so subscribers see a channel that never fires rather than one that closes.
    events: broadcast::Sender<AuthChange>,
}

impl UnavailableBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(1);
        Self { events }
    }
}

impl Default for UnavailableBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthClient for UnavailableBackend {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn sign_up(&self, _request: SignUpRequest) -> Result<SignUpResponse, BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn sign_in_with_password(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<Session, BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn reset_password_for_email(
        &self,
        _email: &str,
        _redirect_to: Option<&str>,
    ) -> Result<(), BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn update_password(&self, _password: &str) -> Result<AuthUser, BackendError> {
        Err(BackendError::Unavailable)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }

    async fn get_user(&self, _access_token: &str) -> Result<AuthUser, BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn admin_create_user(&self, _request: AdminUserRequest) -> Result<AuthUser, BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn admin_delete_user(&self, _id: Uuid) -> Result<(), BackendError> {
        Err(BackendError::Unavailable)
    }
}

#[async_trait]
impl TableClient for UnavailableBackend {
    async fn select(&self, _query: &Query) -> Result<Vec<Value>, BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn insert(&self, _table: &str, _rows: Vec<Value>) -> Result<Vec<Value>, BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn update(&self, _query: &Query, _patch: Value) -> Result<Vec<Value>, BackendError> {
        Err(BackendError::Unavailable)
    }
}
