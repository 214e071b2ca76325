//! Client-side checks run before any backend call.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Each variant displays as its translation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("invalid_email")]
    InvalidEmail,
    #[error("password_length_error")]
    PasswordTooShort,
    #[error("password_mismatch")]
    PasswordMismatch,
    #[error("name_required")]
    NameRequired,
    #[error("accept_terms_error")]
    TermsNotAccepted,
    #[error("journal_empty")]
    JournalEmpty,
}

impl FormError {
    pub fn key(self) -> &'static str {
        match self {
            FormError::InvalidEmail => "invalid_email",
            FormError::PasswordTooShort => "password_length_error",
            FormError::PasswordMismatch => "password_mismatch",
            FormError::NameRequired => "name_required",
            FormError::TermsNotAccepted => "accept_terms_error",
            FormError::JournalEmpty => "journal_empty",
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

pub fn check_email(email: &str) -> Result<(), FormError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(FormError::InvalidEmail)
    }
}

pub fn check_password(password: &str) -> Result<(), FormError> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(FormError::PasswordTooShort)
    }
}

pub fn check_confirmation(password: &str, confirm: &str) -> Result<(), FormError> {
    if password == confirm {
        Ok(())
    } else {
        Err(FormError::PasswordMismatch)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FormError> {
        check_email(&self.email)?;
        check_password(&self.password)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub accept_terms: bool,
}

impl SignupForm {
    /// Checks run in the order the fields appear on the page.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.name.trim().is_empty() {
            return Err(FormError::NameRequired);
        }
        check_email(&self.email)?;
        check_password(&self.password)?;
        check_confirmation(&self.password, &self.confirm_password)?;
        if !self.accept_terms {
            return Err(FormError::TermsNotAccepted);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetForm {
    pub email: String,
}

impl ResetForm {
    pub fn validate(&self) -> Result<(), FormError> {
        check_email(&self.email)
    }
}

/// New password chosen on the page the reset e-mail links to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPasswordForm {
    pub password: String,
    pub confirm_password: String,
}

impl NewPasswordForm {
    pub fn validate(&self) -> Result<(), FormError> {
        check_password(&self.password)?;
        check_confirmation(&self.password, &self.confirm_password)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalForm {
    pub text: String,
    pub mood: Option<String>,
}

impl JournalForm {
    pub fn validate(&self) -> Result<(), FormError> {
        if self.text.trim().is_empty() {
            Err(FormError::JournalEmpty)
        } else {
            Ok(())
        }
    }
}
