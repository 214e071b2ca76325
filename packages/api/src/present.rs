//! # Presentation seam
//!
//! The auth manager and form controller never touch a document directly. They
//! report what the user should see through a [`Presenter`]: a message, a
//! navigation, a change of auth state, a tab switch. Message text is a
//! translation key; the presenter renders it in the active language.

use std::sync::Mutex;

use crate::auth::AuthState;
use crate::forms::AuthTab;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Login,
    Dashboard,
    ResetPassword,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Landing => "/index.html",
            Route::Login => "/pages/login.html",
            Route::Dashboard => "/pages/dashboard.html",
            Route::ResetPassword => "/pages/reset-password.html",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    /// Translation key.
    pub key: String,
    /// Backend-provided detail shown alongside the key, if any.
    pub detail: Option<String>,
}

impl Message {
    pub fn success(key: impl Into<String>) -> Self {
        Self::new(MessageKind::Success, key)
    }

    pub fn error(key: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, key)
    }

    pub fn info(key: impl Into<String>) -> Self {
        Self::new(MessageKind::Info, key)
    }

    fn new(kind: MessageKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

pub trait Presenter: Send + Sync {
    fn show_message(&self, message: Message);

    fn navigate(&self, route: Route);

    fn auth_state_changed(&self, _state: &AuthState) {}

    fn show_tab(&self, _tab: AuthTab) {}
}

/// Writes everything to the log. Used where no document is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn show_message(&self, message: Message) {
        match message.kind {
            MessageKind::Error => tracing::warn!("{} {:?}", message.key, message.detail),
            _ => tracing::info!("{} {:?}", message.key, message.detail),
        }
    }

    fn navigate(&self, route: Route) {
        tracing::info!("Navigate to {}", route.path());
    }

    fn auth_state_changed(&self, state: &AuthState) {
        tracing::debug!("Auth state: authenticated={}", state.is_authenticated());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Presented {
    Message(Message),
    Navigate(Route),
    AuthState(AuthState),
    Tab(AuthTab),
}

/// Keeps every call in order, for inspection.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    log: Mutex<Vec<Presented>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Presented> {
        self.log.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Presented::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn last_message(&self) -> Option<Message> {
        self.messages().pop()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Presented::Navigate(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn tabs(&self) -> Vec<AuthTab> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Presented::Tab(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Presented) {
        self.log.lock().unwrap().push(event);
    }
}

impl Presenter for RecordingPresenter {
    fn show_message(&self, message: Message) {
        self.push(Presented::Message(message));
    }

    fn navigate(&self, route: Route) {
        self.push(Presented::Navigate(route));
    }

    fn auth_state_changed(&self, state: &AuthState) {
        self.push(Presented::AuthState(state.clone()));
    }

    fn show_tab(&self, tab: AuthTab) {
        self.push(Presented::Tab(tab));
    }
}
