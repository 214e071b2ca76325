//! The two serverless functions.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `/signup` | [`signup_handler`]: privileged account + profile creation with rollback |
//! | `/protected-api/{endpoint}` | [`protected_handler`]: bearer-token API for `stats`, `users` and `content` |

mod protected;
mod signup;

pub use protected::protected_handler;
pub use signup::signup_handler;

use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
