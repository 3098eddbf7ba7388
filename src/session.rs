//! Session context for the signed-in guest.
//!
//! Authentication happens upstream; requests arrive with identity headers
//! already set by the gateway. Handlers receive the session as an explicit
//! extracted value rather than reading ambient global state.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// The signed-in guest making the request
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let user_id = header("x-user-id").ok_or(AppError::Unauthorized)?;

        Ok(Self {
            user_id,
            full_name: header("x-user-name").unwrap_or_else(|| "User".to_string()),
            email: header("x-user-email").unwrap_or_default(),
        })
    }
}
