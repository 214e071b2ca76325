use std::sync::Arc;

use api::Backend;

use crate::error::ApiError;
use crate::settings::Settings;

/// Shared by every request. `backend` is `None` when the service-role secrets
/// are missing; each request then fails with a configuration error.
#[derive(Clone)]
pub struct AppState {
    backend: Option<Arc<dyn Backend>>,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> Self {
        let config = settings.backend_config();
        if !config.is_complete() {
            tracing::warn!("SUPABASE_URL or SUPABASE_SERVICE_KEY not set; requests will fail");
            return Self::unconfigured();
        }
        Self {
            backend: Some(api::connect(&config)),
        }
    }

    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub fn unconfigured() -> Self {
        Self { backend: None }
    }

    pub fn backend(&self) -> Result<&Arc<dyn Backend>, ApiError> {
        self.backend.as_ref().ok_or_else(|| {
            tracing::error!("Backend credentials missing");
            ApiError::Configuration
        })
    }
}
