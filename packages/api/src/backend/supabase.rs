//! # Live backend over the hosted service's REST endpoints
//!
//! - Auth: `{url}/auth/v1/...` (sign-up, password grant, refresh grant, logout,
//!   recover, user, admin/users).
//! - Tables: `{url}/rest/v1/{table}` with PostgREST query parameters rendered by
//!   [`Query::to_params`].
//!
//! Every request carries the `apikey` header. Table calls authenticate as the
//! signed-in user when a session is held and as the configured key otherwise,
//! so a backend built from the service-role key acts with elevated rights.
//!
//! The session lives only in memory. An expired session that still has a
//! refresh token is renewed on the next [`get_session`](AuthClient::get_session)
//! and announced as [`AuthEvent::TokenRefreshed`].

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    AdminUserRequest, AuthChange, AuthClient, AuthEvent, AuthUser, BackendError, Query, Session,
    SignUpRequest, SignUpResponse, TableClient,
};

/// Token grant response from the auth service.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| Utc::now().timestamp() + secs));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

pub struct SupabaseBackend {
    http: Client,
    url: String,
    key: String,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthChange>,
}

impl std::fmt::Debug for SupabaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseBackend")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl SupabaseBackend {
    pub fn new(url: &str, key: &str) -> Result<Self, BackendError> {
        let http = Client::builder().build()?;
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            session: RwLock::new(None),
            events,
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    async fn bearer(&self) -> String {
        match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.key.clone(),
        }
    }

    fn publish(&self, event: AuthEvent, session: Option<Session>) {
        // No receivers is fine.
        let _ = self.events.send(AuthChange { event, session });
    }

    async fn store_session(&self, session: Session, event: AuthEvent) {
        *self.session.write().await = Some(session.clone());
        self.publish(event, Some(session));
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.header("apikey", &self.key).send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from(response).await)
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = self.execute(request).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, BackendError> {
        let token: TokenResponse = self
            .send_json(
                self.http
                    .post(self.auth_url("token"))
                    .query(&[("grant_type", "refresh_token")])
                    .json(&json!({ "refresh_token": refresh_token })),
            )
            .await?;
        Ok(token.into_session())
    }
}

/// Decode an error body from either the auth service or the table API.
async fn error_from(response: Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

    let code = ["error_code", "code"]
        .iter()
        .find_map(|k| parsed.get(*k).and_then(Value::as_str))
        .map(str::to_string);
    let message = ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|k| parsed.get(*k).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| if body.is_empty() { format!("HTTP {status}") } else { body });

    BackendError::Api {
        status,
        code,
        message,
    }
}

#[async_trait]
impl AuthClient for SupabaseBackend {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        let current = self.session.read().await.clone();
        let Some(session) = current else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.clone() else {
            *self.session.write().await = None;
            self.publish(AuthEvent::SignedOut, None);
            return Ok(None);
        };

        debug!("Refreshing expired session for {}", session.user.id);
        match self.refresh(&refresh_token).await {
            Ok(renewed) => {
                self.store_session(renewed.clone(), AuthEvent::TokenRefreshed).await;
                Ok(Some(renewed))
            }
            Err(e) => {
                warn!("Session refresh failed: {}", e);
                *self.session.write().await = None;
                self.publish(AuthEvent::SignedOut, None);
                Err(e)
            }
        }
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpResponse, BackendError> {
        let mut builder = self.http.post(self.auth_url("signup")).json(&json!({
            "email": request.email,
            "password": request.password,
            "data": request.data,
        }));
        if let Some(redirect) = &request.email_redirect_to {
            builder = builder.query(&[("redirect_to", redirect.as_str())]);
        }

        let body: Value = self.send_json(builder).await?;

        if body.get("access_token").is_some() {
            let session = serde_json::from_value::<TokenResponse>(body)?.into_session();
            self.store_session(session.clone(), AuthEvent::SignedIn).await;
            return Ok(SignUpResponse {
                user: Some(session.user.clone()),
                session: Some(session),
            });
        }

        let user_value = body.get("user").cloned().unwrap_or(body);
        Ok(SignUpResponse {
            user: Some(serde_json::from_value(user_value)?),
            session: None,
        })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        let token: TokenResponse = self
            .send_json(
                self.http
                    .post(self.auth_url("token"))
                    .query(&[("grant_type", "password")])
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        let session = token.into_session();
        self.store_session(session.clone(), AuthEvent::SignedIn).await;
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let held = self.session.write().await.take();
        let Some(session) = held else {
            return Ok(());
        };
        self.publish(AuthEvent::SignedOut, None);

        self.execute(
            self.http
                .post(self.auth_url("logout"))
                .bearer_auth(&session.access_token),
        )
        .await?;
        Ok(())
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), BackendError> {
        let mut builder = self
            .http
            .post(self.auth_url("recover"))
            .json(&json!({ "email": email }));
        if let Some(redirect) = redirect_to {
            builder = builder.query(&[("redirect_to", redirect)]);
        }
        self.execute(builder).await?;
        Ok(())
    }

    async fn update_password(&self, password: &str) -> Result<AuthUser, BackendError> {
        let Some(mut session) = self.get_session().await? else {
            return Err(BackendError::api(401, None, "Auth session missing"));
        };
        let user: AuthUser = self
            .send_json(
                self.http
                    .put(self.auth_url("user"))
                    .bearer_auth(&session.access_token)
                    .json(&json!({ "password": password })),
            )
            .await?;
        session.user = user.clone();
        self.store_session(session, AuthEvent::UserUpdated).await;
        Ok(user)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        self.send_json(self.http.get(self.auth_url("user")).bearer_auth(access_token))
            .await
    }

    async fn admin_create_user(&self, request: AdminUserRequest) -> Result<AuthUser, BackendError> {
        self.send_json(
            self.http
                .post(self.auth_url("admin/users"))
                .bearer_auth(&self.key)
                .json(&request),
        )
        .await
    }

    async fn admin_delete_user(&self, id: Uuid) -> Result<(), BackendError> {
        self.execute(
            self.http
                .delete(self.auth_url(&format!("admin/users/{id}")))
                .bearer_auth(&self.key),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TableClient for SupabaseBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, BackendError> {
        let bearer = self.bearer().await;
        self.send_json(
            self.http
                .get(self.rest_url(query.table()))
                .bearer_auth(bearer)
                .query(&query.to_params()),
        )
        .await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, BackendError> {
        let bearer = self.bearer().await;
        self.send_json(
            self.http
                .post(self.rest_url(table))
                .bearer_auth(bearer)
                .header("Prefer", "return=representation")
                .json(&rows),
        )
        .await
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, BackendError> {
        let bearer = self.bearer().await;
        self.send_json(
            self.http
                .patch(self.rest_url(query.table()))
                .bearer_auth(bearer)
                .header("Prefer", "return=representation")
                .query(&query.filter_params())
                .json(&patch),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_ignore_trailing_slash() {
        let backend = SupabaseBackend::new("https://abc.supabase.co/", "anon").unwrap();
        assert_eq!(backend.auth_url("signup"), "https://abc.supabase.co/auth/v1/signup");
        assert_eq!(backend.rest_url("users"), "https://abc.supabase.co/rest/v1/users");
    }

    #[test]
    fn test_token_response_computes_expiry() {
        let token: TokenResponse = serde_json::from_value(json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "user": { "id": Uuid::new_v4(), "email": "a@b.co" }
        }))
        .unwrap();
        let session = token.into_session();
        assert!(session.expires_at.unwrap() > Utc::now().timestamp());
        assert_eq!(session.refresh_token.as_deref(), Some("r"));
    }

    #[tokio::test]
    async fn test_no_session_uses_configured_key() {
        let backend = SupabaseBackend::new("https://abc.supabase.co", "service-key").unwrap();
        assert_eq!(backend.bearer().await, "service-key");
        assert!(backend.get_session().await.unwrap().is_none());
    }

    mod live {
        use std::collections::{HashMap, VecDeque};
        use std::sync::{Arc, Mutex};

        use axum::{
            body::Bytes,
            extract::State,
            http::{HeaderMap, Method, StatusCode, Uri},
            Json, Router,
        };
        use tokio::sync::broadcast::error::TryRecvError;

        use super::*;
        use crate::backend::{DUPLICATE_KEY, POLICY_VIOLATION};

        #[derive(Debug, Clone)]
        struct Recorded {
            path: String,
            query: String,
            headers: HeaderMap,
            body: Value,
        }

        impl Recorded {
            fn header(&self, name: &str) -> Option<&str> {
                self.headers.get(name).and_then(|v| v.to_str().ok())
            }
        }

        /// Stand-in for the hosted service: replies are queued per
        /// `"METHOD /path"` and every request is recorded.
        #[derive(Default)]
        struct FakeService {
            replies: Mutex<HashMap<String, VecDeque<(StatusCode, Value)>>>,
            requests: Mutex<Vec<Recorded>>,
        }

        impl FakeService {
            fn reply(&self, route: &str, status: u16, body: Value) {
                self.replies
                    .lock()
                    .unwrap()
                    .entry(route.to_string())
                    .or_default()
                    .push_back((StatusCode::from_u16(status).unwrap(), body));
            }

            fn requests(&self) -> Vec<Recorded> {
                self.requests.lock().unwrap().clone()
            }
        }

        async fn answer(
            State(fake): State<Arc<FakeService>>,
            method: Method,
            uri: Uri,
            headers: HeaderMap,
            body: Bytes,
        ) -> (StatusCode, Json<Value>) {
            let route = format!("{} {}", method, uri.path());
            fake.requests.lock().unwrap().push(Recorded {
                path: uri.path().to_string(),
                query: uri.query().unwrap_or_default().to_string(),
                headers,
                body: serde_json::from_slice(&body).unwrap_or(Value::Null),
            });
            let reply = fake
                .replies
                .lock()
                .unwrap()
                .get_mut(&route)
                .and_then(VecDeque::pop_front);
            match reply {
                Some((status, body)) => (status, Json(body)),
                None => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "message": format!("no reply for {route}") })),
                ),
            }
        }

        async fn serve(fake: Arc<FakeService>) -> SupabaseBackend {
            let app = Router::new().fallback(answer).with_state(fake);
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
            SupabaseBackend::new(&format!("http://{addr}"), "anon-key").unwrap()
        }

        fn grant(access_token: &str, expires_at: i64, user_id: Uuid) -> Value {
            json!({
                "access_token": access_token,
                "token_type": "bearer",
                "expires_at": expires_at,
                "refresh_token": format!("refresh-{access_token}"),
                "user": { "id": user_id, "email": "seeker@atlantis.test" }
            })
        }

        fn in_an_hour() -> i64 {
            Utc::now().timestamp() + 3600
        }

        #[tokio::test]
        async fn test_error_bodies_keep_codes() {
            let fake = Arc::new(FakeService::default());
            fake.reply(
                "POST /rest/v1/users",
                409,
                json!({ "code": DUPLICATE_KEY, "message": "duplicate key value violates unique constraint \"users_pkey\"" }),
            );
            fake.reply(
                "PATCH /rest/v1/users",
                403,
                json!({ "code": POLICY_VIOLATION, "message": "new row violates row-level security policy" }),
            );
            fake.reply(
                "POST /auth/v1/token",
                400,
                json!({ "code": 400, "error_code": "invalid_credentials", "msg": "Invalid login credentials" }),
            );
            fake.reply("GET /rest/v1/content", 502, Value::Null);
            let backend = serve(fake).await;

            let err = backend
                .insert("users", vec![json!({ "id": Uuid::new_v4() })])
                .await
                .unwrap_err();
            assert!(err.is_duplicate_key());
            assert_eq!(err.status(), Some(409));

            let err = backend
                .update(&Query::from("users").eq("id", "x"), json!({ "journal_entries": 1 }))
                .await
                .unwrap_err();
            assert!(err.is_policy_violation());

            let err = backend
                .sign_in_with_password("seeker@atlantis.test", "wrong")
                .await
                .unwrap_err();
            assert_eq!(err.code(), Some("invalid_credentials"));
            assert_eq!(err.to_string(), "Invalid login credentials");

            let err = backend.select(&Query::from("content")).await.unwrap_err();
            assert_eq!(err.status(), Some(502));
            assert_eq!(err.code(), None);
        }

        #[tokio::test]
        async fn test_requests_carry_apikey_and_bearer() {
            let fake = Arc::new(FakeService::default());
            let id = Uuid::new_v4();
            fake.reply("POST /rest/v1/journal_entries", 201, json!([{ "content": "dawn" }]));
            fake.reply("POST /auth/v1/token", 200, grant("user-jwt", in_an_hour(), id));
            fake.reply("GET /rest/v1/users", 200, json!([{ "id": id, "role": "user" }]));
            let backend = serve(fake.clone()).await;

            let stored = backend
                .insert("journal_entries", vec![json!({ "content": "dawn" })])
                .await
                .unwrap();
            assert_eq!(stored, vec![json!({ "content": "dawn" })]);

            backend
                .sign_in_with_password("seeker@atlantis.test", "secret1")
                .await
                .unwrap();
            let rows = backend
                .select(&Query::from("users").select("role").eq("id", id.to_string()))
                .await
                .unwrap();
            assert_eq!(rows.len(), 1);

            let requests = fake.requests();
            assert_eq!(requests.len(), 3);
            assert!(requests.iter().all(|r| r.header("apikey") == Some("anon-key")));

            let insert = &requests[0];
            assert_eq!(insert.header("prefer"), Some("return=representation"));
            assert_eq!(insert.header("authorization"), Some("Bearer anon-key"));
            assert_eq!(insert.body, json!([{ "content": "dawn" }]));

            let sign_in = &requests[1];
            assert_eq!(sign_in.path, "/auth/v1/token");
            assert_eq!(sign_in.query, "grant_type=password");

            let select = &requests[2];
            assert_eq!(select.header("authorization"), Some("Bearer user-jwt"));
            assert!(select.query.contains("select=role"));
            assert!(select.query.contains(&format!("id=eq.{id}")));
        }

        #[tokio::test]
        async fn test_sign_up_with_immediate_session() {
            let fake = Arc::new(FakeService::default());
            let id = Uuid::new_v4();
            fake.reply("POST /auth/v1/signup", 200, grant("fresh-jwt", in_an_hour(), id));
            let backend = serve(fake.clone()).await;
            let mut events = backend.subscribe();

            let response = backend
                .sign_up(SignUpRequest {
                    email: "seeker@atlantis.test".into(),
                    password: "secret1".into(),
                    data: json!({ "name": "Seeker" }),
                    email_redirect_to: Some("http://localhost:8888/pages/login.html".into()),
                })
                .await
                .unwrap();

            assert_eq!(response.user.unwrap().id, id);
            assert_eq!(response.session.unwrap().access_token, "fresh-jwt");
            assert_eq!(events.try_recv().unwrap().event, AuthEvent::SignedIn);
            let held = backend.get_session().await.unwrap().unwrap();
            assert_eq!(held.user.id, id);

            let request = &fake.requests()[0];
            assert_eq!(request.body["data"]["name"], "Seeker");
            assert!(request.query.starts_with("redirect_to="));
        }

        #[tokio::test]
        async fn test_sign_up_awaiting_confirmation_holds_no_session() {
            let fake = Arc::new(FakeService::default());
            let id = Uuid::new_v4();
            fake.reply(
                "POST /auth/v1/signup",
                200,
                json!({
                    "id": id,
                    "email": "seeker@atlantis.test",
                    "identities": [{ "provider": "email" }],
                    "confirmation_sent_at": "2026-10-17T08:00:00Z"
                }),
            );
            let backend = serve(fake).await;
            let mut events = backend.subscribe();

            let response = backend
                .sign_up(SignUpRequest {
                    email: "seeker@atlantis.test".into(),
                    password: "secret1".into(),
                    data: json!({}),
                    email_redirect_to: None,
                })
                .await
                .unwrap();

            let user = response.user.unwrap();
            assert_eq!(user.id, id);
            assert!(!user.is_obfuscated());
            assert!(response.session.is_none());
            assert!(backend.get_session().await.unwrap().is_none());
            assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
        }

        #[tokio::test]
        async fn test_expired_session_is_refreshed() {
            let fake = Arc::new(FakeService::default());
            let id = Uuid::new_v4();
            let expired = Utc::now().timestamp() - 10;
            fake.reply("POST /auth/v1/token", 200, grant("stale-jwt", expired, id));
            fake.reply("POST /auth/v1/token", 200, grant("renewed-jwt", in_an_hour(), id));
            let backend = serve(fake.clone()).await;
            let mut events = backend.subscribe();

            backend
                .sign_in_with_password("seeker@atlantis.test", "secret1")
                .await
                .unwrap();
            assert_eq!(events.try_recv().unwrap().event, AuthEvent::SignedIn);

            let session = backend.get_session().await.unwrap().unwrap();
            assert_eq!(session.access_token, "renewed-jwt");
            let change = events.try_recv().unwrap();
            assert_eq!(change.event, AuthEvent::TokenRefreshed);
            assert_eq!(change.session.unwrap().access_token, "renewed-jwt");

            let refresh = &fake.requests()[1];
            assert_eq!(refresh.query, "grant_type=refresh_token");
            assert_eq!(refresh.body["refresh_token"], "refresh-stale-jwt");

            // Fresh now, so no second refresh.
            backend.get_session().await.unwrap();
            assert_eq!(fake.requests().len(), 2);
        }

        #[tokio::test]
        async fn test_failed_refresh_signs_out() {
            let fake = Arc::new(FakeService::default());
            let expired = Utc::now().timestamp() - 10;
            fake.reply("POST /auth/v1/token", 200, grant("stale-jwt", expired, Uuid::new_v4()));
            fake.reply(
                "POST /auth/v1/token",
                400,
                json!({ "error_code": "refresh_token_not_found", "msg": "Invalid Refresh Token" }),
            );
            let backend = serve(fake).await;
            backend
                .sign_in_with_password("seeker@atlantis.test", "secret1")
                .await
                .unwrap();
            let mut events = backend.subscribe();

            let err = backend.get_session().await.unwrap_err();
            assert_eq!(err.code(), Some("refresh_token_not_found"));
            assert_eq!(events.try_recv().unwrap().event, AuthEvent::SignedOut);
            assert!(backend.get_session().await.unwrap().is_none());
            assert_eq!(backend.bearer().await, "anon-key");
        }
    }
}
