use axum::{body::Bytes, extract::State, http::Method, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use api::backend::AdminUserRequest;
use api::db::profiles;
use api::models::NewProfile;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct SignupBody {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

fn required(field: Option<String>) -> Result<String, ApiError> {
    field
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingFields)
}

/// Create a confirmed account and its profile row. If the profile insert fails
/// the account is deleted again.
pub async fn signup_handler(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    if method != Method::POST {
        return Err(ApiError::MethodNotAllowed);
    }

    let body: SignupBody = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Malformed signup body: {}", e);
        ApiError::MalformedPayload
    })?;
    let email = required(body.email)?;
    // Passwords are taken as sent.
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or(ApiError::MissingFields)?;
    let name = required(body.name)?;

    let backend = state.backend()?;

    let user = backend
        .admin_create_user(AdminUserRequest {
            email: email.clone(),
            password,
            email_confirm: true,
            user_metadata: json!({ "name": name }),
        })
        .await
        .map_err(|e| {
            tracing::error!("Auth error: {}", e);
            ApiError::UserCreation
        })?;

    let email = user.email.clone().unwrap_or(email);
    let row = NewProfile::new(user.id, email.clone(), Some(name.clone()));
    if let Err(e) = profiles::insert(backend.as_ref(), &row).await {
        tracing::error!("Profile error: {}", e);
        if let Err(e) = backend.admin_delete_user(user.id).await {
            tracing::error!("Failed to remove auth user {} after profile error: {}", user.id, e);
        }
        return Err(ApiError::ProfileCreation);
    }

    tracing::info!("Created user {}", user.id);
    Ok(Json(json!({
        "success": true,
        "message": "User created successfully",
        "user": {
            "id": user.id,
            "email": email,
            "name": name,
        }
    })))
}
