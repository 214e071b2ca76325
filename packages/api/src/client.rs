//! Backend client wrapper.
//!
//! [`connect`] picks the live backend when a complete configuration is
//! available and the [`UnavailableBackend`] otherwise, so callers always hold a
//! working `Arc<dyn Backend>` with a uniform failure contract.
//! [`SharedClient`] builds that handle once and hands out clones of it.

use std::sync::{Arc, OnceLock};

use crate::backend::{Backend, SupabaseBackend, UnavailableBackend};
use crate::config::BackendConfig;

pub fn connect(config: &BackendConfig) -> Arc<dyn Backend> {
    let Ok((url, key)) = config.require() else {
        tracing::error!("Backend URL or key missing; backend calls will fail");
        return Arc::new(UnavailableBackend::new());
    };

    match SupabaseBackend::new(url, key) {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            tracing::error!("Failed to build backend client: {}", e);
            Arc::new(UnavailableBackend::new())
        }
    }
}

/// Lazily constructed, process-scoped backend handle.
pub struct SharedClient {
    config: BackendConfig,
    handle: OnceLock<Arc<dyn Backend>>,
}

impl SharedClient {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            handle: OnceLock::new(),
        }
    }

    /// Same handle on every call.
    pub fn get(&self) -> Arc<dyn Backend> {
        self.handle.get_or_init(|| connect(&self.config)).clone()
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}
