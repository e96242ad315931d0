use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::{error, warn};

use super::{jwt::JwtKeys, repo_types::UserProfile};
use crate::{error::ApiError, state::AppState};

/// The user resolved from a valid bearer token.
pub struct AuthUser(pub UserProfile);

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(ApiError::unauthorized)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            ApiError::Unauthorized("Token is not valid".into())
        })?;

        // Store failures stay 500s; only a missing user is a 401.
        let user = state
            .users
            .find_profile(claims.sub)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %claims.sub, "user lookup failed in auth");
                ApiError::Internal(anyhow::anyhow!("Internal server error"))
            })?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token for missing user");
                ApiError::Unauthorized("Token is not valid".into())
            })?;

        Ok(AuthUser(user))
    }
}
