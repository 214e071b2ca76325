//! # API crate: the Atlantis client core and backend seam
//!
//! Everything between the pages of the Atlantis site and its hosted
//! backend-as-a-service lives here. The browser-side managers (auth, forms) and
//! the server-side handlers in the `web` crate share the same backend
//! capability, models and table access.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`backend`] | The [`Backend`] capability (auth + tables) with live, unavailable and in-memory implementations, and the [`Query`] builder |
//! | [`client`] | Backend client wrapper: picks an implementation from a [`BackendConfig`] and shares one handle |
//! | [`config`] | [`BackendConfig`] from the environment, the site file, or server settings |
//! | [`auth`] | [`AuthManager`]: session state, sign-up with profile provisioning, role checks |
//! | [`forms`] | [`FormController`]: validation, submit guards, journal saving |
//! | [`db`] | Typed reads and writes for the `users`, `journal_entries` and `content` tables |
//! | [`models`] | Row types: [`Profile`], journal entries, content items |
//! | [`present`] | The [`Presenter`] seam the managers report to |
//! | [`error`] | [`AuthError`], the error taxonomy shared by all of the above |
//!
//! ## Start-up
//!
//! ```no_run
//! use std::sync::Arc;
//! use api::{AuthManager, AuthSettings, BackendConfig, SharedClient, TracingPresenter};
//!
//! # async fn run() {
//! let client = SharedClient::new(BackendConfig::from_env());
//! let auth = AuthManager::new(client.get(), Arc::new(TracingPresenter), AuthSettings::default());
//! auth.init().await;
//! # }
//! ```

pub mod auth;
pub mod backend;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod models;
pub mod present;

pub use auth::{AuthManager, AuthSettings, AuthState, Backoff, ProfileProvisioning, SignUpOutcome};
pub use backend::{Backend, BackendError, MemoryBackend, Query};
pub use client::{connect, SharedClient};
pub use config::BackendConfig;
pub use error::AuthError;
pub use forms::{AuthTab, FormController, FormError};
pub use models::{Profile, Role, StatField, UserStats};
pub use present::{Message, MessageKind, Presenter, RecordingPresenter, Route, TracingPresenter};
