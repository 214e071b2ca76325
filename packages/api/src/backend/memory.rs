//! # In-memory backend
//!
//! A complete [`Backend`](super::Backend) held in process memory, used as the
//! test double throughout the workspace and for running the server without a
//! hosted project.
//!
//! It models the parts of the hosted service the application depends on:
//!
//! - accounts with passwords, optional e-mail confirmation, bearer tokens;
//! - one held client session plus session-change notifications;
//! - tables as JSON rows with a unique `id` column (violations report `23505`);
//! - row-level policy: unless built with [`MemoryBackend::service_role`], writes
//!   require a session, and `users` rows may only be written for the session's
//!   own id (violations report `42501`);
//! - one-shot fault injection keyed by operation (`"insert:users"`,
//!   `"select:users"`, `"update:users"`, `"sign_out"`, `"admin_create_user"`).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{
    AdminUserRequest, AuthChange, AuthClient, AuthEvent, AuthUser, BackendError, Query, Session,
    SignUpRequest, SignUpResponse, TableClient, DUPLICATE_KEY, POLICY_VIOLATION,
};

#[derive(Debug, Clone)]
struct Account {
    user: AuthUser,
    password: String,
    confirmed: bool,
}

#[derive(Debug, Clone)]
struct Fault {
    status: u16,
    code: Option<String>,
    message: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<Uuid, Account>,
    tokens: HashMap<String, Uuid>,
    session: Option<Session>,
    tables: HashMap<String, Vec<Value>>,
    faults: HashMap<String, VecDeque<Fault>>,
    password_resets: Vec<String>,
}

impl MemoryState {
    fn take_fault(&mut self, key: &str) -> Option<BackendError> {
        let fault = self.faults.get_mut(key)?.pop_front()?;
        Some(BackendError::Api {
            status: fault.status,
            code: fault.code,
            message: fault.message,
        })
    }

    fn account_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts
            .values()
            .find(|a| a.user.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
    }

    fn issue_session(&mut self, user: AuthUser) -> Session {
        let token = format!("mem-{}", Uuid::new_v4());
        self.tokens.insert(token.clone(), user.id);
        Session {
            access_token: token,
            refresh_token: Some(format!("mem-refresh-{}", Uuid::new_v4())),
            expires_at: Some(Utc::now().timestamp() + 3600),
            user,
        }
    }
}

#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    events: broadcast::Sender<AuthChange>,
    require_confirmation: bool,
    row_level_security: bool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Client-side view: row-level policy enforced, e-mails auto-confirmed.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(MemoryState::default()),
            events,
            require_confirmation: false,
            row_level_security: true,
        }
    }

    /// Privileged view, as seen with the service-role key: no row-level policy.
    pub fn service_role() -> Self {
        Self {
            row_level_security: false,
            ..Self::new()
        }
    }

    /// New accounts cannot sign in until [`confirm_email`](Self::confirm_email).
    pub fn with_email_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    /// Create a confirmed account directly.
    pub fn seed_user(&self, email: &str, password: &str, name: &str) -> AuthUser {
        let user = new_user(email, json!({ "name": name }));
        self.state.lock().unwrap().accounts.insert(
            user.id,
            Account {
                user: user.clone(),
                password: password.to_string(),
                confirmed: true,
            },
        );
        user
    }

    /// Mint a bearer token for an existing account without touching the held session.
    pub fn issue_token(&self, user_id: Uuid) -> String {
        let token = format!("mem-{}", Uuid::new_v4());
        self.state.lock().unwrap().tokens.insert(token.clone(), user_id);
        token
    }

    pub fn seed_row(&self, table: &str, row: Value) {
        self.state
            .lock()
            .unwrap()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn account_count(&self) -> usize {
        self.state.lock().unwrap().accounts.len()
    }

    pub fn has_account(&self, email: &str) -> bool {
        self.state.lock().unwrap().account_by_email(email).is_some()
    }

    pub fn confirm_email(&self, email: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(account) = state
            .accounts
            .values_mut()
            .find(|a| a.user.email.as_deref() == Some(email))
        {
            account.confirmed = true;
            account.user.email_confirmed_at = Some(Utc::now());
        }
    }

    pub fn password_resets(&self) -> Vec<String> {
        self.state.lock().unwrap().password_resets.clone()
    }

    /// Fail the next call of `operation` with the given API error.
    pub fn inject_fault(&self, operation: &str, status: u16, code: Option<&str>, message: &str) {
        self.state
            .lock()
            .unwrap()
            .faults
            .entry(operation.to_string())
            .or_default()
            .push_back(Fault {
                status,
                code: code.map(str::to_string),
                message: message.to_string(),
            });
    }

    fn publish(&self, event: AuthEvent, session: Option<Session>) {
        let _ = self.events.send(AuthChange { event, session });
    }

    fn check_policy(&self, state: &MemoryState, table: &str, row: &Value) -> Result<(), BackendError> {
        if !self.row_level_security {
            return Ok(());
        }
        let Some(session) = &state.session else {
            return Err(policy_error(table));
        };
        if table == "users" {
            let own = row.get("id").and_then(Value::as_str) == Some(&session.user.id.to_string());
            if !own {
                return Err(policy_error(table));
            }
        }
        Ok(())
    }
}

fn new_user(email: &str, metadata: Value) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        email: Some(email.to_string()),
        user_metadata: metadata,
        identities: Some(vec![json!({ "provider": "email" })]),
        email_confirmed_at: None,
    }
}

fn policy_error(table: &str) -> BackendError {
    BackendError::api(
        403,
        Some(POLICY_VIOLATION),
        format!("new row violates row-level security policy for table \"{table}\""),
    )
}

fn invalid_credentials() -> BackendError {
    BackendError::api(400, Some("invalid_credentials"), "Invalid login credentials")
}

#[async_trait]
impl AuthClient for MemoryBackend {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        Ok(self.state.lock().unwrap().session.clone())
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpResponse, BackendError> {
        let session = {
            let mut state = self.state.lock().unwrap();
            if let Some(err) = state.take_fault("sign_up") {
                return Err(err);
            }
            if state.account_by_email(&request.email).is_some() {
                return Err(BackendError::api(
                    422,
                    Some("user_already_exists"),
                    "User already registered",
                ));
            }

            let mut user = new_user(&request.email, request.data);
            if !self.require_confirmation {
                user.email_confirmed_at = Some(Utc::now());
            }
            state.accounts.insert(
                user.id,
                Account {
                    user: user.clone(),
                    password: request.password,
                    confirmed: !self.require_confirmation,
                },
            );

            if self.require_confirmation {
                return Ok(SignUpResponse {
                    user: Some(user),
                    session: None,
                });
            }
            let session = state.issue_session(user);
            state.session = Some(session.clone());
            session
        };

        self.publish(AuthEvent::SignedIn, Some(session.clone()));
        Ok(SignUpResponse {
            user: Some(session.user.clone()),
            session: Some(session),
        })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        let session = {
            let mut state = self.state.lock().unwrap();
            if let Some(err) = state.take_fault("sign_in") {
                return Err(err);
            }
            let account = state.account_by_email(email).cloned().ok_or_else(invalid_credentials)?;
            if account.password != password {
                return Err(invalid_credentials());
            }
            if !account.confirmed {
                return Err(BackendError::api(400, Some("email_not_confirmed"), "Email not confirmed"));
            }
            let session = state.issue_session(account.user);
            state.session = Some(session.clone());
            session
        };

        self.publish(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        {
            let mut state = self.state.lock().unwrap();
            if let Some(err) = state.take_fault("sign_out") {
                return Err(err);
            }
            if let Some(session) = state.session.take() {
                state.tokens.remove(&session.access_token);
            }
        }
        self.publish(AuthEvent::SignedOut, None);
        Ok(())
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        _redirect_to: Option<&str>,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.take_fault("reset_password") {
            return Err(err);
        }
        state.password_resets.push(email.to_string());
        Ok(())
    }

    async fn update_password(&self, password: &str) -> Result<AuthUser, BackendError> {
        let session = {
            let mut state = self.state.lock().unwrap();
            let Some(session) = state.session.clone() else {
                return Err(BackendError::api(401, None, "Auth session missing"));
            };
            if let Some(account) = state.accounts.get_mut(&session.user.id) {
                account.password = password.to_string();
            }
            session
        };
        let user = session.user.clone();
        self.publish(AuthEvent::UserUpdated, Some(session));
        Ok(user)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        let state = self.state.lock().unwrap();
        state
            .tokens
            .get(access_token)
            .and_then(|id| state.accounts.get(id))
            .map(|account| account.user.clone())
            .ok_or_else(|| BackendError::api(401, Some("bad_jwt"), "invalid JWT"))
    }

    async fn admin_create_user(&self, request: AdminUserRequest) -> Result<AuthUser, BackendError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.take_fault("admin_create_user") {
            return Err(err);
        }
        if state.account_by_email(&request.email).is_some() {
            return Err(BackendError::api(
                422,
                Some("email_exists"),
                "A user with this email address has already been registered",
            ));
        }
        let mut user = new_user(&request.email, request.user_metadata);
        if request.email_confirm {
            user.email_confirmed_at = Some(Utc::now());
        }
        state.accounts.insert(
            user.id,
            Account {
                user: user.clone(),
                password: request.password,
                confirmed: request.email_confirm,
            },
        );
        Ok(user)
    }

    async fn admin_delete_user(&self, id: Uuid) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.accounts.remove(&id).is_none() {
            return Err(BackendError::api(404, Some("user_not_found"), "User not found"));
        }
        state.tokens.retain(|_, owner| *owner != id);
        Ok(())
    }
}

#[async_trait]
impl TableClient for MemoryBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, BackendError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.take_fault(&format!("select:{}", query.table())) {
            return Err(err);
        }
        Ok(state
            .tables
            .get(query.table())
            .map(|rows| query.apply(rows))
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, BackendError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.take_fault(&format!("insert:{table}")) {
            return Err(err);
        }

        let mut prepared = Vec::with_capacity(rows.len());
        for mut row in rows {
            self.check_policy(&state, table, &row)?;
            if let Value::Object(map) = &mut row {
                map.entry("id")
                    .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
                map.entry("created_at")
                    .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
            }
            prepared.push(row);
        }

        let existing = state.tables.entry(table.to_string()).or_default();
        for row in &prepared {
            let id = row.get("id");
            let clash = existing.iter().chain(prepared.iter().filter(|r| !std::ptr::eq(*r, row)))
                .any(|other| other.get("id") == id);
            if clash {
                return Err(BackendError::api(
                    409,
                    Some(DUPLICATE_KEY),
                    format!("duplicate key value violates unique constraint \"{table}_pkey\""),
                ));
            }
        }
        existing.extend(prepared.iter().cloned());
        Ok(prepared)
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, BackendError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.take_fault(&format!("update:{}", query.table())) {
            return Err(err);
        }

        let targets: Vec<Value> = state
            .tables
            .get(query.table())
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();
        for row in &targets {
            self.check_policy(&state, query.table(), row)?;
        }

        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(query.table()) {
            for row in rows.iter_mut().filter(|r| query.matches(r)) {
                if let (Value::Object(target), Value::Object(changes)) = (&mut *row, &patch) {
                    for (k, v) in changes {
                        target.insert(k.clone(), v.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }
}
