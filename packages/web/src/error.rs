//! HTTP error responses.
//!
//! Every variant renders as its status code and a JSON body
//! `{"error": "<message>"}`. Messages are fixed strings; the underlying cause is
//! logged by the handler and never sent to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Malformed request body")]
    MalformedPayload,

    #[error("Missing required fields")]
    MissingFields,

    #[error("Server configuration error")]
    Configuration,

    #[error("Unable to create user")]
    UserCreation,

    #[error("Failed to create user profile")]
    ProfileCreation,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Access denied")]
    AccessDenied,

    #[error("Admin access required")]
    AdminRequired,

    #[error("Endpoint not found")]
    EndpointNotFound,

    /// A backend call inside an endpoint failed.
    #[error("{0}")]
    Failed(&'static str),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::MalformedPayload | ApiError::MissingFields | ApiError::UserCreation => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::AccessDenied | ApiError::AdminRequired => StatusCode::FORBIDDEN,
            ApiError::EndpointNotFound => StatusCode::NOT_FOUND,
            ApiError::Configuration
            | ApiError::ProfileCreation
            | ApiError::Failed(_)
            | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
