//! # Form controller
//!
//! Binds the login, sign-up, password reset and journal forms to the
//! [`AuthManager`]. Each submit validates locally first, holds the submit
//! control busy through a [`SubmitGuard`] for the length of the backend call,
//! and reports the result to the presenter as a translated message key.
//!
//! Failures are returned as well as shown, so callers can react, but the
//! controller has already told the user.

mod journal;
mod submit;
mod validate;

use std::sync::{Arc, Mutex};

use store::Translate;

pub use submit::{Button, SubmitControl, SubmitGuard};
pub use validate::{
    is_valid_email, FormError, JournalForm, LoginForm, NewPasswordForm, ResetForm, SignupForm,
    MIN_PASSWORD_LEN,
};

use crate::auth::AuthManager;
use crate::error::AuthError;
use crate::present::{Message, Presenter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthTab {
    #[default]
    Login,
    Signup,
    Reset,
}

/// Show/hide state of a password field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PasswordVisibility {
    visible: bool,
}

impl PasswordVisibility {
    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The `type` attribute the input should carry.
    pub fn input_type(&self) -> &'static str {
        if self.visible {
            "text"
        } else {
            "password"
        }
    }
}

pub struct FormController {
    auth: Arc<AuthManager>,
    translator: Arc<dyn Translate + Send + Sync>,
    tab: Mutex<AuthTab>,
}

impl FormController {
    pub fn new(auth: Arc<AuthManager>, translator: Arc<dyn Translate + Send + Sync>) -> Self {
        Self {
            auth,
            translator,
            tab: Mutex::new(AuthTab::default()),
        }
    }

    pub fn auth(&self) -> &Arc<AuthManager> {
        &self.auth
    }

    pub fn tab(&self) -> AuthTab {
        *self.tab.lock().unwrap()
    }

    pub fn select_tab(&self, tab: AuthTab) {
        *self.tab.lock().unwrap() = tab;
        self.presenter().show_tab(tab);
    }

    pub async fn login(
        &self,
        form: &LoginForm,
        submit: &mut dyn SubmitControl,
    ) -> Result<(), AuthError> {
        self.check(form.validate())?;
        let busy = self.translator.translate("logging_in", "Logging in...");
        let _busy = SubmitGuard::new(submit, &busy);

        match self.auth.sign_in(form.email.trim(), &form.password).await {
            Ok(_) => Ok(()),
            Err(e) => Err(self.report("login_failed", e)),
        }
    }

    pub async fn signup(
        &self,
        form: &SignupForm,
        submit: &mut dyn SubmitControl,
    ) -> Result<(), AuthError> {
        self.check(form.validate())?;
        let busy = self
            .translator
            .translate("creating_account", "Creating account...");
        let _busy = SubmitGuard::new(submit, &busy);

        let outcome = self
            .auth
            .sign_up(form.email.trim(), &form.password, form.name.trim())
            .await
            .map_err(|e| self.report("signup_failed", e))?;

        let key = if outcome.confirmation_required {
            "confirm_email"
        } else {
            "signup_success"
        };
        self.presenter().show_message(Message::success(key));
        self.select_tab(AuthTab::Login);
        Ok(())
    }

    pub async fn reset(
        &self,
        form: &ResetForm,
        submit: &mut dyn SubmitControl,
    ) -> Result<(), AuthError> {
        self.check(form.validate())?;
        let busy = self
            .translator
            .translate("sending_reset_link", "Sending reset link...");
        let _busy = SubmitGuard::new(submit, &busy);

        self.auth
            .reset_password(form.email.trim())
            .await
            .map_err(|e| self.report("reset_failed", e))?;

        self.presenter()
            .show_message(Message::success("reset_email_sent"));
        self.select_tab(AuthTab::Login);
        Ok(())
    }

    pub async fn update_password(
        &self,
        form: &NewPasswordForm,
        submit: &mut dyn SubmitControl,
    ) -> Result<(), AuthError> {
        self.check(form.validate())?;
        let busy = self.translator.translate("saving", "Saving...");
        let _busy = SubmitGuard::new(submit, &busy);

        self.auth
            .update_password(&form.password)
            .await
            .map_err(|e| self.report("password_update_failed", e))?;

        self.presenter()
            .show_message(Message::success("password_updated"));
        Ok(())
    }

    fn presenter(&self) -> &Arc<dyn Presenter> {
        self.auth.presenter()
    }

    fn check(&self, result: Result<(), FormError>) -> Result<(), AuthError> {
        result.map_err(|e| {
            self.presenter().show_message(Message::error(e.key()));
            AuthError::from(e)
        })
    }

    /// Show `err` under `failure_key` and hand it back. Only validation
    /// messages from the backend are passed through as detail.
    fn report(&self, failure_key: &str, err: AuthError) -> AuthError {
        let message = match &err {
            AuthError::ValidationFailed(detail) => {
                Message::error(failure_key).with_detail(detail.clone())
            }
            other => Message::error(other.message_key().unwrap_or(failure_key)),
        };
        self.presenter().show_message(message);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthSettings;
    use crate::backend::{AuthClient, Backend, MemoryBackend, UnavailableBackend};
    use crate::present::{MessageKind, RecordingPresenter};
    use store::Catalog;

    pub(super) fn controller(
        backend: Arc<dyn Backend>,
    ) -> (FormController, Arc<RecordingPresenter>) {
        let presenter = Arc::new(RecordingPresenter::new());
        let auth = Arc::new(AuthManager::new(
            backend,
            presenter.clone(),
            AuthSettings::default(),
        ));
        let forms = FormController::new(auth, Arc::new(Catalog::embedded("en")));
        (forms, presenter)
    }

    #[tokio::test]
    async fn test_invalid_login_never_reaches_backend() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed_user("seeker@atlantis.test", "secret1", "Seeker");
        let (forms, presenter) = controller(backend.clone());
        let mut button = Button::new("Login");

        let form = LoginForm {
            email: "seeker@atlantis.test".into(),
            password: "123".into(),
        };
        let err = forms.login(&form, &mut button).await.unwrap_err();

        assert!(matches!(err, AuthError::ValidationFailed(_)));
        assert_eq!(presenter.last_message().unwrap().key, "password_length_error");
        assert!(button.history().is_empty());
        assert!(backend.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_busy_label_and_restore() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed_user("seeker@atlantis.test", "secret1", "Seeker");
        let (forms, presenter) = controller(backend.clone());
        let mut button = Button::new("Login");

        let form = LoginForm {
            email: "seeker@atlantis.test".into(),
            password: "wrong-password".into(),
        };
        assert!(forms.login(&form, &mut button).await.is_err());
        assert!(button.was_busy_with("Logging in..."));
        assert_eq!(button.label(), "Login");
        assert!(button.is_enabled());

        let failure = presenter.last_message().unwrap();
        assert_eq!(failure.kind, MessageKind::Error);
        assert_eq!(failure.key, "login_failed");
        assert_eq!(failure.detail.as_deref(), Some("Invalid login credentials"));

        let form = LoginForm {
            email: "seeker@atlantis.test".into(),
            password: "secret1".into(),
        };
        forms.login(&form, &mut button).await.unwrap();
        assert!(forms.auth().state().is_authenticated());
        assert!(button.is_enabled());
    }

    #[tokio::test]
    async fn test_signup_switches_to_login_tab() {
        let backend = Arc::new(MemoryBackend::new());
        let (forms, presenter) = controller(backend.clone());
        forms.select_tab(AuthTab::Signup);
        let mut button = Button::new("Create Account");

        let form = SignupForm {
            name: "Seeker".into(),
            email: "seeker@atlantis.test".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            accept_terms: true,
        };
        forms.signup(&form, &mut button).await.unwrap();

        assert_eq!(presenter.last_message().unwrap().key, "signup_success");
        assert_eq!(forms.tab(), AuthTab::Login);
        assert_eq!(presenter.tabs(), vec![AuthTab::Signup, AuthTab::Login]);
        assert!(button.was_busy_with("Creating account..."));
        assert_eq!(backend.rows("users").len(), 1);
    }

    #[tokio::test]
    async fn test_signup_requires_terms() {
        let (forms, presenter) = controller(Arc::new(MemoryBackend::new()));
        let form = SignupForm {
            name: "Seeker".into(),
            email: "seeker@atlantis.test".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            accept_terms: false,
        };
        assert!(forms.signup(&form, &mut Button::new("Go")).await.is_err());
        assert_eq!(presenter.last_message().unwrap().key, "accept_terms_error");
    }

    #[tokio::test]
    async fn test_reset_shows_confirmation() {
        let backend = Arc::new(MemoryBackend::new());
        let (forms, presenter) = controller(backend.clone());
        let form = ResetForm {
            email: "seeker@atlantis.test".into(),
        };
        forms.reset(&form, &mut Button::new("Reset")).await.unwrap();

        assert_eq!(presenter.last_message().unwrap().key, "reset_email_sent");
        assert_eq!(backend.password_resets(), vec!["seeker@atlantis.test"]);
    }

    #[tokio::test]
    async fn test_unavailable_backend_reports_generic_message() {
        let (forms, presenter) = controller(Arc::new(UnavailableBackend::new()));
        let form = LoginForm {
            email: "seeker@atlantis.test".into(),
            password: "secret1".into(),
        };
        let mut button = Button::new("Login");
        assert!(matches!(
            forms.login(&form, &mut button).await,
            Err(AuthError::ServiceUnavailable)
        ));
        assert_eq!(presenter.last_message().unwrap().key, "service_unavailable");
        assert!(button.is_enabled());
    }

    #[tokio::test]
    async fn test_update_password_requires_session() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed_user("seeker@atlantis.test", "secret1", "Seeker");
        let (forms, presenter) = controller(backend.clone());
        let form = NewPasswordForm {
            password: "newpass1".into(),
            confirm_password: "newpass1".into(),
        };

        assert!(forms
            .update_password(&form, &mut Button::new("Save"))
            .await
            .is_err());

        forms
            .auth()
            .sign_in("seeker@atlantis.test", "secret1")
            .await
            .unwrap();
        forms
            .update_password(&form, &mut Button::new("Save"))
            .await
            .unwrap();
        assert_eq!(presenter.last_message().unwrap().key, "password_updated");
        assert!(backend
            .sign_in_with_password("seeker@atlantis.test", "newpass1")
            .await
            .is_ok());
    }

    #[test]
    fn test_password_visibility_toggle() {
        let mut field = PasswordVisibility::default();
        assert_eq!(field.input_type(), "password");
        assert!(field.toggle());
        assert_eq!(field.input_type(), "text");
        assert!(!field.toggle());
    }
}
