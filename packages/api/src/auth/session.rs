//! Auth state and settings held by the [`AuthManager`](super::AuthManager).

use store::SiteConfig;

use super::Backoff;
use crate::backend::{AuthUser, Session};
use crate::models::Profile;
use crate::present::Route;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated(AuthUser),
}

impl AuthState {
    pub fn from_session(session: Option<&Session>) -> Self {
        match session {
            Some(s) => AuthState::Authenticated(s.user.clone()),
            None => AuthState::Anonymous,
        }
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            AuthState::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthSettings {
    /// Origin the e-mail links point back to.
    pub site_url: String,
    pub backoff: Backoff,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self::from_site(&SiteConfig::default())
    }
}

impl AuthSettings {
    pub fn from_site(site: &SiteConfig) -> Self {
        Self {
            site_url: site.auth.site_url.trim_end_matches('/').to_string(),
            backoff: Backoff::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Absolute URL of a page on this site.
    pub fn link(&self, route: Route) -> String {
        format!("{}{}", self.site_url, route.path())
    }
}

/// Terminal state of a sign-up's profile provisioning.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileProvisioning {
    Created(Profile),
    /// A row with this id was already there.
    AlreadyExists,
    /// Retries exhausted; the profile is created lazily on first fetch instead.
    Abandoned { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub provisioning: ProfileProvisioning,
    /// The account exists but cannot sign in until the e-mail is confirmed.
    pub confirmation_required: bool,
}

impl SignUpOutcome {
    pub fn profile(&self) -> Option<&Profile> {
        match &self.provisioning {
            ProfileProvisioning::Created(profile) => Some(profile),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_are_absolute() {
        let mut site = SiteConfig::default();
        site.auth.site_url = "https://atlantis.example/".into();
        let settings = AuthSettings::from_site(&site);

        assert_eq!(
            settings.link(Route::Login),
            "https://atlantis.example/pages/login.html"
        );
        assert_eq!(
            settings.link(Route::ResetPassword),
            "https://atlantis.example/pages/reset-password.html"
        );
    }
}
