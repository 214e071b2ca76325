use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use api::db::{content, journal, profiles};
use api::models::{NewContent, Role};
use api::Backend;

use super::bearer_token;
use crate::error::ApiError;
use crate::state::AppState;

const RECENT_JOURNALS: usize = 5;
const USER_PAGE: usize = 50;

/// Authenticate the bearer token, load the caller's role, then dispatch on the
/// last path segment.
pub async fn protected_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    let backend = state.backend()?;

    let user = backend.get_user(token).await.map_err(|e| {
        tracing::debug!("Token rejected: {}", e);
        ApiError::InvalidToken
    })?;

    let role = match profiles::role(backend.as_ref(), user.id).await {
        Ok(Some(role)) => role,
        Ok(None) => return Err(ApiError::AccessDenied),
        Err(e) => {
            tracing::warn!("Role lookup failed for {}: {}", user.id, e);
            return Err(ApiError::AccessDenied);
        }
    };

    let endpoint = uri.path().rsplit('/').find(|s| !s.is_empty()).unwrap_or("");
    match endpoint {
        "stats" => stats(backend, user.id, &method).await,
        "users" => {
            if role != Role::Admin {
                return Err(ApiError::AdminRequired);
            }
            users(backend, &method).await
        }
        "content" => content_endpoint(backend, user.id, &method, &body).await,
        _ => Err(ApiError::EndpointNotFound),
    }
}

async fn stats(
    backend: &Arc<dyn Backend>,
    user_id: Uuid,
    method: &Method,
) -> Result<Response, ApiError> {
    if method != Method::GET {
        return Err(ApiError::MethodNotAllowed);
    }
    let failed = |e: api::BackendError| {
        tracing::error!("Stats error: {}", e);
        ApiError::Failed("Failed to fetch stats")
    };

    let user_stats = profiles::stats(backend.as_ref(), user_id)
        .await
        .map_err(failed)?;
    let recent = journal::recent(backend.as_ref(), user_id, RECENT_JOURNALS)
        .await
        .map_err(failed)?;

    Ok(Json(json!({ "userStats": user_stats, "recentJournals": recent })).into_response())
}

async fn users(backend: &Arc<dyn Backend>, method: &Method) -> Result<Response, ApiError> {
    if method != Method::GET {
        return Err(ApiError::MethodNotAllowed);
    }
    let users = profiles::list(backend.as_ref(), USER_PAGE)
        .await
        .map_err(|e| {
            tracing::error!("Users error: {}", e);
            ApiError::Failed("Failed to fetch users")
        })?;
    Ok(Json(json!({ "users": users })).into_response())
}

#[derive(Debug, Default, Deserialize)]
struct ContentBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    published: Option<bool>,
}

/// Reading is open to any authenticated caller, and so is writing.
async fn content_endpoint(
    backend: &Arc<dyn Backend>,
    user_id: Uuid,
    method: &Method,
    body: &[u8],
) -> Result<Response, ApiError> {
    match *method {
        Method::GET => {
            let items = content::published(backend.as_ref()).await.map_err(|e| {
                tracing::error!("Get content error: {}", e);
                ApiError::Failed("Failed to fetch content")
            })?;
            Ok(Json(json!({ "content": items })).into_response())
        }
        Method::POST => {
            let body: ContentBody = if body.iter().all(u8::is_ascii_whitespace) {
                ContentBody::default()
            } else {
                serde_json::from_slice(body).map_err(|e| {
                    tracing::debug!("Malformed content body: {}", e);
                    ApiError::MalformedPayload
                })?
            };
            let (Some(title), Some(text)) = (
                body.title.filter(|t| !t.is_empty()),
                body.content.filter(|c| !c.is_empty()),
            ) else {
                return Err(ApiError::MissingFields);
            };

            let item = NewContent::new(user_id, title, text, body.kind, body.published);
            let created = content::insert(backend.as_ref(), &item).await.map_err(|e| {
                tracing::error!("Create content error: {}", e);
                ApiError::Failed("Failed to create content")
            })?;
            Ok((StatusCode::CREATED, Json(json!({ "content": created }))).into_response())
        }
        _ => Err(ApiError::MethodNotAllowed),
    }
}
