//! # Session/Auth manager
//!
//! [`AuthManager`] owns the "current user" for one client session. It is an
//! explicit context object: construct it once with a backend handle, a
//! [`Presenter`] and [`AuthSettings`], then pass it to whatever needs it.
//!
//! ## Lifecycle
//!
//! [`AuthManager::init`] fetches the existing session and spawns a listener on
//! the backend's session-change notifications. The listener keeps the
//! [`AuthState`] current and tells the presenter about sign-ins and sign-outs.
//! Operations that change the session also update the state directly, so a
//! call made right after `sign_in` sees the new user without waiting for the
//! notification. Notifications arrive late, so the listener checks each one
//! against the backend's current session and ignores a `SignedIn` or
//! `SignedOut` that has since been superseded.
//!
//! ## Profile provisioning
//!
//! Sign-up creates the profile row as the new user. Row-level policy only
//! allows that once a session exists, and with e-mail confirmation enabled it
//! may never exist before the user clicks the link. Provisioning therefore
//! retries with a bounded exponential [`Backoff`] while there is no session or
//! the insert is rejected by policy, and ends in a terminal
//! [`ProfileProvisioning::Abandoned`] instead of failing the sign-up. A
//! duplicate id means the row is already there. [`AuthManager::get_profile`]
//! creates the row lazily for anyone whose provisioning was abandoned.
//!
//! ## Errors
//!
//! Every operation returns an [`AuthError`]; nothing panics or propagates a
//! backend error type past this module. Authorization checks fail closed.

mod backoff;
mod session;

use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

pub use backoff::Backoff;
pub use session::{AuthSettings, AuthState, ProfileProvisioning, SignUpOutcome};

use crate::backend::{AuthChange, AuthEvent, AuthUser, Backend, BackendError, Session, SignUpRequest};
use crate::db::profiles;
use crate::error::AuthError;
use crate::models::{NewProfile, Profile, Role};
use crate::present::{Message, Presenter, Route};

pub struct AuthManager {
    backend: Arc<dyn Backend>,
    presenter: Arc<dyn Presenter>,
    settings: AuthSettings,
    state: Arc<RwLock<AuthState>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl AuthManager {
    pub fn new(
        backend: Arc<dyn Backend>,
        presenter: Arc<dyn Presenter>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            backend,
            presenter,
            settings,
            state: Arc::new(RwLock::new(AuthState::Anonymous)),
            listener: Mutex::new(None),
        }
    }

    /// Restore the existing session and start following session changes.
    pub async fn init(&self) -> AuthState {
        let changes = self.backend.subscribe();

        let state = match self.backend.get_session().await {
            Ok(session) => AuthState::from_session(session.as_ref()),
            Err(e) => {
                tracing::warn!("Failed to fetch session, continuing anonymously: {}", e);
                AuthState::Anonymous
            }
        };
        self.set_state(state.clone());

        let handle = tokio::spawn(listen(
            changes,
            self.backend.clone(),
            self.state.clone(),
            self.presenter.clone(),
        ));
        if let Some(previous) = self.listener.lock().unwrap().replace(handle) {
            previous.abort();
        }
        state
    }

    pub fn state(&self) -> AuthState {
        self.state.read().unwrap().clone()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.state.read().unwrap().user().cloned()
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn presenter(&self) -> &Arc<dyn Presenter> {
        &self.presenter
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Register, sign in, then provision the profile row.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SignUpOutcome, AuthError> {
        let request = SignUpRequest {
            email: email.to_string(),
            password: password.to_string(),
            data: json!({ "name": name, "created_at": Utc::now().to_rfc3339() }),
            email_redirect_to: Some(self.settings.link(Route::Login)),
        };

        let response = self.backend.sign_up(request).await.map_err(|e| {
            tracing::error!("Sign up failed: {}", e);
            AuthError::from(e)
        })?;

        let user = response
            .user
            .clone()
            .or_else(|| response.session.as_ref().map(|s| s.user.clone()))
            .ok_or_else(|| {
                AuthError::RemoteServiceError(BackendError::Decode(
                    "sign-up returned no user".into(),
                ))
            })?;
        if user.is_obfuscated() {
            tracing::info!("Sign up for an already registered address");
            return Err(AuthError::ValidationFailed("User already registered".into()));
        }

        let mut session = response.session;
        if session.is_none() {
            match self.backend.sign_in_with_password(email, password).await {
                Ok(s) => session = Some(s),
                Err(e) => tracing::info!("Sign in after sign up failed: {}", e),
            }
        }
        if session.is_some() {
            self.set_state(AuthState::Authenticated(user.clone()));
        }

        let provisioning = match self.create_profile(&user, name).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Profile creation failed for {}: {}", user.id, e);
                ProfileProvisioning::Abandoned {
                    reason: e.to_string(),
                }
            }
        };

        Ok(SignUpOutcome {
            user,
            provisioning,
            confirmation_required: session.is_none(),
        })
    }

    /// Insert the profile row for `user`, retrying while no session exists or
    /// row-level policy rejects the insert.
    pub async fn create_profile(
        &self,
        user: &AuthUser,
        name: &str,
    ) -> Result<ProfileProvisioning, AuthError> {
        let row = NewProfile::for_user(user, Some(name));
        let mut retry = 0;

        loop {
            let reason = match self.backend.get_session().await? {
                None => "no session".to_string(),
                Some(_) => match profiles::insert(self.backend.as_ref(), &row).await {
                    Ok(profile) => {
                        tracing::info!("Created profile {}", profile.id);
                        return Ok(ProfileProvisioning::Created(profile));
                    }
                    Err(e) if e.is_duplicate_key() => {
                        tracing::debug!("Profile {} already exists", user.id);
                        return Ok(ProfileProvisioning::AlreadyExists);
                    }
                    Err(e) if e.is_policy_violation() => {
                        format!("row-level policy rejected insert: {e}")
                    }
                    Err(e) => {
                        tracing::error!("Profile insert failed: {}", e);
                        return Err(e.into());
                    }
                },
            };

            let Some(delay) = self.settings.backoff.delay(retry) else {
                tracing::warn!(
                    "Giving up on profile for {} after {} retries ({}); the user may need to confirm their email",
                    user.id,
                    retry,
                    reason
                );
                return Ok(ProfileProvisioning::Abandoned { reason });
            };
            tracing::debug!("Profile not created ({}), retrying in {:?}", reason, delay);
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self
            .backend
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| {
                tracing::error!("Sign in error: {}", e);
                AuthError::from(e)
            })?;
        self.set_state(AuthState::Authenticated(session.user.clone()));
        Ok(session)
    }

    /// Always ends anonymous on the landing page, even when the backend call fails.
    pub async fn sign_out(&self) {
        if let Err(e) = self.backend.sign_out().await {
            tracing::error!("Sign out error: {}", e);
        }
        self.set_state(AuthState::Anonymous);
        self.presenter.navigate(Route::Landing);
    }

    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let redirect = self.settings.link(Route::ResetPassword);
        self.backend
            .reset_password_for_email(email, Some(&redirect))
            .await
            .map_err(|e| {
                tracing::error!("Reset password error: {}", e);
                AuthError::from(e)
            })
    }

    pub async fn update_password(&self, new_password: &str) -> Result<(), AuthError> {
        if self.current_user().is_none() {
            return Err(AuthError::Unauthenticated);
        }
        self.backend
            .update_password(new_password)
            .await
            .map(|_| ())
            .map_err(|e| {
                tracing::error!("Update password error: {}", e);
                AuthError::from(e)
            })
    }

    /// False when anonymous, when the role is not `admin`, and on any error.
    pub async fn is_admin(&self) -> bool {
        let Some(user) = self.current_user() else {
            return false;
        };
        match profiles::role(self.backend.as_ref(), user.id).await {
            Ok(role) => role == Some(Role::Admin),
            Err(e) => {
                tracing::debug!("Role lookup failed for {}: {}", user.id, e);
                false
            }
        }
    }

    /// Admin page gate: sends everyone else to the landing page.
    pub async fn require_admin(&self) -> bool {
        let admin = self.is_admin().await;
        if !admin {
            self.presenter.navigate(Route::Landing);
        }
        admin
    }

    /// The caller's profile, creating a default row if none exists yet.
    /// `None` only when anonymous.
    pub async fn get_profile(&self) -> Result<Option<Profile>, AuthError> {
        let Some(user) = self.current_user() else {
            return Ok(None);
        };
        let backend = self.backend.as_ref();

        if let Some(profile) = profiles::find(backend, user.id).await? {
            return Ok(Some(profile));
        }

        tracing::info!("No profile for {}, creating default", user.id);
        match profiles::insert(backend, &NewProfile::for_user(&user, None)).await {
            Ok(profile) => Ok(Some(profile)),
            Err(e) if e.is_duplicate_key() => Ok(profiles::find(backend, user.id).await?),
            Err(e) => {
                tracing::error!("Get user data error: {}", e);
                Err(e.into())
            }
        }
    }

    fn set_state(&self, state: AuthState) {
        *self.state.write().unwrap() = state;
    }
}

impl Drop for AuthManager {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.lock().unwrap().take() {
            handle.abort();
        }
    }
}

async fn listen(
    mut changes: tokio::sync::broadcast::Receiver<AuthChange>,
    backend: Arc<dyn Backend>,
    state: Arc<RwLock<AuthState>>,
    presenter: Arc<dyn Presenter>,
) {
    loop {
        let change = match changes.recv().await {
            Ok(change) => change,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Missed {} session changes", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let current = match backend.get_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::debug!("Session lookup after {:?} failed: {}", change.event, e);
                change.session.clone()
            }
        };
        let current_user = current.as_ref().map(|s| s.user.id);
        let event_user = change.session.as_ref().map(|s| s.user.id);

        let next = AuthState::from_session(current.as_ref());
        *state.write().unwrap() = next.clone();
        presenter.auth_state_changed(&next);

        match change.event {
            AuthEvent::SignedIn if event_user.is_some() && event_user == current_user => {
                presenter.show_message(Message::success("welcome_back"));
                presenter.navigate(Route::Dashboard);
            }
            AuthEvent::SignedOut if current_user.is_none() => {
                presenter.show_message(Message::info("logged_out"))
            }
            AuthEvent::SignedIn | AuthEvent::SignedOut => {
                tracing::debug!("Ignoring stale {:?} notification", change.event);
            }
            _ => {}
        }
    }
}
