//! The error taxonomy every auth, form and handler operation reports in.

use thiserror::Error;

use crate::backend::BackendError;
use crate::forms::FormError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// A required secret or URL is absent.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(&'static str),
    #[error("not authenticated")]
    Unauthenticated,
    #[error("insufficient permissions")]
    Forbidden,
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    #[error("backend error: {0}")]
    RemoteServiceError(#[source] BackendError),
    /// Idempotent create conflict; callers treat it as success.
    #[error("resource already exists")]
    DuplicateResource,
    #[error("backend service unavailable")]
    ServiceUnavailable,
}

impl AuthError {
    /// Translation key for the message shown to the user, if more specific
    /// than the caller's own failure key.
    pub fn message_key(&self) -> Option<&'static str> {
        match self {
            AuthError::ServiceUnavailable | AuthError::ConfigurationMissing(_) => {
                Some("service_unavailable")
            }
            _ => None,
        }
    }
}

impl From<BackendError> for AuthError {
    fn from(e: BackendError) -> Self {
        if matches!(e, BackendError::Unavailable) {
            return AuthError::ServiceUnavailable;
        }
        if e.is_duplicate_key() {
            return AuthError::DuplicateResource;
        }
        if e.is_policy_violation() {
            return AuthError::Forbidden;
        }
        match (e.status(), &e) {
            (Some(401), _) => AuthError::Unauthenticated,
            (Some(400 | 422), BackendError::Api { message, .. }) => {
                AuthError::ValidationFailed(message.clone())
            }
            _ => AuthError::RemoteServiceError(e),
        }
    }
}

impl From<FormError> for AuthError {
    fn from(e: FormError) -> Self {
        AuthError::ValidationFailed(e.key().to_string())
    }
}
